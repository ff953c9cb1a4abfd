use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use serde_json::json;

use crate::error::{PapertagError, Result};
use crate::models::{Resolution, ValidationResult, VocabularyDocument};
use crate::normalize::AliasCollision;
use crate::vocabulary::{VocabularyChange, VocabularyStore};

use super::Papertag;

impl Papertag {
    pub fn categories(&self) -> Result<Vec<String>> {
        Ok(self.read_vocabulary()?.categories())
    }

    pub fn vocabulary(&self) -> Result<VocabularyDocument> {
        Ok(self.read_vocabulary()?.document().clone())
    }

    pub fn canonical_labels(&self, category: &str) -> Result<Vec<String>> {
        Ok(self.read_vocabulary()?.get_canonical_labels(category))
    }

    pub fn aliases(&self, canonical_label: &str) -> Result<Vec<String>> {
        Ok(self.read_vocabulary()?.get_aliases(canonical_label))
    }

    pub fn add_canonical_label(
        &self,
        category: &str,
        label: &str,
        aliases: &[String],
    ) -> Result<VocabularyChange> {
        self.logged(
            "vocabulary.add_label",
            Some(format!("{category}/{}", label.trim())),
            || {
                self.write_vocabulary()?
                    .add_canonical_label(category, label, aliases, &self.normalizer)
            },
            |change| {
                Some(json!({
                    "added_label": change.added_label,
                    "added_aliases": &change.added_aliases,
                }))
            },
            |_| None,
        )
    }

    #[must_use]
    pub fn resolve_label(&self, raw: &str, category: &str) -> Resolution {
        self.normalizer.resolve(raw, category)
    }

    /// Honors the configured normalization policy: under `reject_unknown`
    /// a label outside the vocabulary is an error.
    pub fn normalize_label(&self, raw: &str, category: &str) -> Result<String> {
        self.normalizer.try_normalize(raw, category)
    }

    #[must_use]
    pub fn validate_label(&self, raw: &str, category: &str) -> ValidationResult {
        self.normalizer.validate(raw, category)
    }

    #[must_use]
    pub fn alias_collisions(&self) -> Vec<AliasCollision> {
        self.normalizer.snapshot().collisions().to_vec()
    }

    pub(super) fn read_vocabulary(&self) -> Result<RwLockReadGuard<'_, VocabularyStore>> {
        self.vocabulary
            .read()
            .map_err(|_| PapertagError::lock_poisoned("vocabulary"))
    }

    fn write_vocabulary(&self) -> Result<RwLockWriteGuard<'_, VocabularyStore>> {
        self.vocabulary
            .write()
            .map_err(|_| PapertagError::lock_poisoned("vocabulary"))
    }
}
