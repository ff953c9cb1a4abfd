use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    Empty,
    Canonical,
    Alias,
    Sentinel,
    Novel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub label: String,
    pub kind: ResolutionKind,
}

impl Resolution {
    #[must_use]
    pub const fn is_novel(&self) -> bool {
        matches!(self.kind, ResolutionKind::Novel)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    ValidCanonical,
    ValidAlias,
    NewTag,
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub reason: ValidationReason,
    pub normalized: String,
}
