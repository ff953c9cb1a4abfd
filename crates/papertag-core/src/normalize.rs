use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PapertagError, Result};
use crate::models::{
    NovelLabelNotice, Perspectives, Resolution, ResolutionKind, ValidationReason,
    ValidationResult, VocabularyDocument, is_sentinel,
};
use crate::text::{lookup_key, slugify};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NormalizationPolicy {
    pub reject_unknown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AliasTarget {
    canonical: String,
    category: String,
    via_alias: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AliasCollision {
    pub key: String,
    pub kept: String,
    pub rejected: String,
    pub category: String,
}

/// Immutable reverse map from every canonical label and alias (lower-cased,
/// all categories flattened) to its canonical label. Replaced wholesale
/// whenever the vocabulary changes.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    entries: HashMap<String, AliasTarget>,
    canonical_by_category: HashMap<String, HashSet<String>>,
    collisions: Vec<AliasCollision>,
}

impl AliasIndex {
    #[must_use]
    pub fn build(vocabulary: &VocabularyDocument) -> Self {
        let mut index = Self::default();

        // Canonical labels go in before any alias so a canonical label always
        // resolves to itself.
        for (category, entry) in vocabulary {
            let declared = index
                .canonical_by_category
                .entry(category.clone())
                .or_default();
            for canonical in entry.canonical_tags.iter().chain(entry.aliases.keys()) {
                declared.insert(canonical.clone());
            }
            for canonical in entry.canonical_tags.iter().chain(entry.aliases.keys()) {
                index.insert(canonical, canonical, category, false);
            }
        }
        // Aliases follow whichever canonical label kept the key, so a canonical
        // that lost a collision never becomes a resolution result.
        for (category, entry) in vocabulary {
            for (canonical, aliases) in &entry.aliases {
                let (target, target_category) = index
                    .entries
                    .get(&lookup_key(canonical))
                    .map_or((canonical.clone(), category.clone()), |kept| {
                        (kept.canonical.clone(), kept.category.clone())
                    });
                for alias in aliases {
                    index.insert(alias, &target, &target_category, true);
                }
            }
        }

        for collision in &index.collisions {
            warn!(
                key = %collision.key,
                kept = %collision.kept,
                rejected = %collision.rejected,
                category = %collision.category,
                "vocabulary key resolves to two canonical labels; keeping the first"
            );
        }
        index
    }

    fn insert(&mut self, raw: &str, canonical: &str, category: &str, via_alias: bool) {
        let key = lookup_key(raw);
        if key.is_empty() {
            return;
        }
        match self.entries.get(&key) {
            Some(existing) if existing.canonical == canonical => {}
            Some(existing) => {
                self.collisions.push(AliasCollision {
                    key,
                    kept: existing.canonical.clone(),
                    rejected: canonical.to_string(),
                    category: category.to_string(),
                });
            }
            None => {
                self.entries.insert(
                    key,
                    AliasTarget {
                        canonical: canonical.to_string(),
                        category: category.to_string(),
                        via_alias,
                    },
                );
            }
        }
    }

    fn lookup(&self, raw: &str) -> Option<&AliasTarget> {
        self.entries.get(&lookup_key(raw))
    }

    #[must_use]
    pub fn canonical_for(&self, raw: &str) -> Option<&str> {
        self.lookup(raw).map(|target| target.canonical.as_str())
    }

    #[must_use]
    pub fn category_for(&self, raw: &str) -> Option<&str> {
        self.lookup(raw).map(|target| target.category.as_str())
    }

    #[must_use]
    pub fn is_canonical_in(&self, category: &str, label: &str) -> bool {
        self.canonical_by_category
            .get(category)
            .is_some_and(|labels| labels.contains(label))
    }

    #[must_use]
    pub fn collisions(&self) -> &[AliasCollision] {
        &self.collisions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedPerspectives {
    pub values: Perspectives,
    pub novel: Vec<NovelLabelNotice>,
}

#[derive(Debug)]
pub struct TagNormalizer {
    index: RwLock<Arc<AliasIndex>>,
    policy: NormalizationPolicy,
}

impl TagNormalizer {
    #[must_use]
    pub fn new(vocabulary: &VocabularyDocument, policy: NormalizationPolicy) -> Self {
        Self {
            index: RwLock::new(Arc::new(AliasIndex::build(vocabulary))),
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> NormalizationPolicy {
        self.policy
    }

    // The guarded value is only ever replaced by a fully built Arc, so a
    // poisoned lock still holds a consistent snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AliasIndex> {
        Arc::clone(&self.index.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn rebuild(&self, vocabulary: &VocabularyDocument) {
        let next = Arc::new(AliasIndex::build(vocabulary));
        let mut slot = self.index.write().unwrap_or_else(PoisonError::into_inner);
        *slot = next;
    }

    #[must_use]
    pub fn resolve(&self, raw: &str, category: &str) -> Resolution {
        let index = self.snapshot();
        resolve_with(&index, raw, category)
    }

    #[must_use]
    pub fn normalize(&self, raw: &str, category: &str) -> String {
        self.resolve(raw, category).label
    }

    pub fn try_normalize(&self, raw: &str, category: &str) -> Result<String> {
        let resolution = self.resolve(raw, category);
        if resolution.is_novel() && self.policy.reject_unknown {
            return Err(PapertagError::NovelLabel {
                category: category.to_string(),
                label: resolution.label,
            });
        }
        Ok(resolution.label)
    }

    #[must_use]
    pub fn normalize_many(&self, perspectives: &Perspectives) -> Perspectives {
        let index = self.snapshot();
        perspectives
            .iter()
            .map(|(category, raw)| {
                let label = if raw.is_empty() {
                    String::new()
                } else {
                    resolve_with(&index, raw, category).label
                };
                (category.clone(), label)
            })
            .collect()
    }

    /// Like `normalize_many`, but reports novel labels and enforces the
    /// `reject_unknown` policy.
    pub fn normalize_perspectives(
        &self,
        perspectives: &Perspectives,
    ) -> Result<NormalizedPerspectives> {
        let index = self.snapshot();
        let mut out = NormalizedPerspectives::default();
        for (category, raw) in perspectives {
            let resolution = resolve_with(&index, raw, category);
            if resolution.is_novel() {
                if self.policy.reject_unknown {
                    return Err(PapertagError::NovelLabel {
                        category: category.clone(),
                        label: resolution.label,
                    });
                }
                out.novel.push(NovelLabelNotice {
                    category: category.clone(),
                    raw: raw.clone(),
                    label: resolution.label.clone(),
                });
            }
            out.values.insert(category.clone(), resolution.label);
        }
        Ok(out)
    }

    #[must_use]
    pub fn validate(&self, raw: &str, category: &str) -> ValidationResult {
        let index = self.snapshot();
        let trimmed = raw.trim();
        let resolution = resolve_with(&index, trimmed, category);

        let reason = if resolution.label.is_empty() {
            ValidationReason::Empty
        } else if index.is_canonical_in(category, trimmed) {
            ValidationReason::ValidCanonical
        } else if index.is_canonical_in(category, &resolution.label) {
            ValidationReason::ValidAlias
        } else if matches!(resolution.kind, ResolutionKind::Sentinel) {
            ValidationReason::ValidCanonical
        } else {
            ValidationReason::NewTag
        };

        let is_valid = match reason {
            ValidationReason::Empty => false,
            ValidationReason::NewTag => !self.policy.reject_unknown,
            ValidationReason::ValidCanonical | ValidationReason::ValidAlias => true,
        };
        ValidationResult {
            is_valid,
            reason,
            normalized: resolution.label,
        }
    }
}

fn resolve_with(index: &AliasIndex, raw: &str, category: &str) -> Resolution {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Resolution {
            label: String::new(),
            kind: ResolutionKind::Empty,
        };
    }

    if let Some(target) = index.lookup(trimmed) {
        let kind = if target.via_alias {
            ResolutionKind::Alias
        } else {
            ResolutionKind::Canonical
        };
        return Resolution {
            label: target.canonical.clone(),
            kind,
        };
    }

    let slug = slugify(trimmed);
    if slug.is_empty() {
        return Resolution {
            label: String::new(),
            kind: ResolutionKind::Empty,
        };
    }
    if let Some(target) = index.lookup(&slug) {
        return Resolution {
            label: target.canonical.clone(),
            kind: ResolutionKind::Alias,
        };
    }
    if is_sentinel(&slug) {
        return Resolution {
            label: slug,
            kind: ResolutionKind::Sentinel,
        };
    }

    warn!(
        category = %category,
        raw = %trimmed,
        label = %slug,
        "label not found in vocabulary, using normalized form"
    );
    Resolution {
        label: slug,
        kind: ResolutionKind::Novel,
    }
}
