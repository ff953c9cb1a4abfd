use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, PapertagError>;

#[derive(Debug, Error)]
pub enum PapertagError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("malformed document {path}: {message}")]
    MalformedDocument { path: String, message: String },

    #[error("novel label '{label}' is not in the {category} vocabulary")]
    NovelLabel { category: String, label: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_norway::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub operation: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl PapertagError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCategory(_) => "UNKNOWN_CATEGORY",
            Self::MalformedDocument { .. } => "MALFORMED_DOCUMENT",
            Self::NovelLabel { .. } => "NOVEL_LABEL",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::Toml(_) => "TOML_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn malformed(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::MalformedDocument {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn lock_poisoned(name: &str) -> Self {
        Self::Internal(format!("{name} lock poisoned"))
    }

    pub fn to_payload(&self, operation: impl Into<String>, target: Option<String>) -> ErrorPayload {
        let details = match self {
            Self::NovelLabel { category, label } => Some(serde_json::json!({
                "category": category,
                "label": label,
            })),
            _ => None,
        };
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            operation: operation.into(),
            trace_id: Uuid::new_v4().to_string(),
            target,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_stable_code_and_omits_empty_details() {
        let payload = PapertagError::UnknownCategory("genre".to_string())
            .to_payload("vocabulary.add", Some("genre".to_string()));
        assert_eq!(payload.code, "UNKNOWN_CATEGORY");
        assert_eq!(payload.message, "unknown category: genre");
        Uuid::parse_str(&payload.trace_id).expect("trace id must be a UUID");

        let value = serde_json::to_value(&payload).expect("serialize");
        assert!(value.get("details").is_none());
    }

    #[test]
    fn novel_label_payload_exposes_category_and_label() {
        let payload = PapertagError::NovelLabel {
            category: "method".to_string(),
            label: "gait_analysis".to_string(),
        }
        .to_payload("catalog.add_record", None);
        let details = payload.details.expect("details");
        assert_eq!(details["category"], "method");
        assert_eq!(details["label"], "gait_analysis");
    }

    #[test]
    fn malformed_names_the_offending_path() {
        let err = PapertagError::malformed(Path::new("/tmp/catalog.json"), "expected value");
        assert_eq!(err.code(), "MALFORMED_DOCUMENT");
        assert!(err.to_string().contains("/tmp/catalog.json"));
    }
}
