use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PapertagError, Result};
use crate::fs::{DocumentFs, VOCABULARY_FILE};
use crate::models::{CategoryVocabulary, VocabularyDocument};
use crate::normalize::TagNormalizer;
use crate::text::lookup_key;

pub const DEFAULT_CATEGORIES: [&str; 5] =
    ["study_type", "disease", "method", "analysis", "population"];

#[must_use]
pub fn default_vocabulary() -> VocabularyDocument {
    DEFAULT_CATEGORIES
        .iter()
        .map(|category| ((*category).to_string(), CategoryVocabulary::default()))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabularyChange {
    pub category: String,
    pub label: String,
    pub added_label: bool,
    pub added_aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VocabularyStore {
    fs: DocumentFs,
    document: VocabularyDocument,
}

impl VocabularyStore {
    pub fn load(fs: DocumentFs) -> Result<Self> {
        let document = fs
            .read_document::<VocabularyDocument>(VOCABULARY_FILE)?
            .ok_or_else(|| PapertagError::NotFound(VOCABULARY_FILE.to_string()))?;
        Ok(Self { fs, document })
    }

    pub fn load_or_default(fs: DocumentFs) -> Result<Self> {
        let document = fs
            .read_document::<VocabularyDocument>(VOCABULARY_FILE)?
            .unwrap_or_else(default_vocabulary);
        Ok(Self { fs, document })
    }

    pub fn persist_if_missing(&self) -> Result<bool> {
        if self.fs.read_optional(VOCABULARY_FILE)?.is_some() {
            return Ok(false);
        }
        self.fs.write_document(VOCABULARY_FILE, &self.document)?;
        Ok(true)
    }

    #[must_use]
    pub fn document(&self) -> &VocabularyDocument {
        &self.document
    }

    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.document.keys().cloned().collect()
    }

    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.document.contains_key(category)
    }

    pub fn require_category(&self, category: &str) -> Result<&CategoryVocabulary> {
        self.document
            .get(category)
            .ok_or_else(|| PapertagError::UnknownCategory(category.to_string()))
    }

    #[must_use]
    pub fn get_canonical_labels(&self, category: &str) -> Vec<String> {
        self.document
            .get(category)
            .map(|entry| entry.canonical_tags.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get_aliases(&self, canonical_label: &str) -> Vec<String> {
        self.document
            .values()
            .find_map(|entry| entry.aliases.get(canonical_label))
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn category_of(&self, canonical_label: &str) -> Option<&str> {
        self.document
            .iter()
            .find(|(_, entry)| {
                entry.contains(canonical_label) || entry.aliases.contains_key(canonical_label)
            })
            .map(|(category, _)| category.as_str())
    }

    /// Idempotent: re-adding a known label or alias changes nothing but still
    /// rewrites the document. Rejects an alias (or label) that already
    /// resolves to a different canonical label.
    pub fn add_canonical_label(
        &mut self,
        category: &str,
        label: &str,
        aliases: &[String],
        normalizer: &TagNormalizer,
    ) -> Result<VocabularyChange> {
        let label = label.trim();
        if label.is_empty() {
            return Err(PapertagError::Validation(
                "canonical label must not be empty".to_string(),
            ));
        }
        self.require_category(category)?;

        let _lock = self.fs.lock_exclusive(VOCABULARY_FILE)?;
        let mut next = self
            .fs
            .read_document::<VocabularyDocument>(VOCABULARY_FILE)?
            .unwrap_or_else(|| self.document.clone());
        if !next.contains_key(category) {
            return Err(PapertagError::UnknownCategory(category.to_string()));
        }

        let index = normalizer.snapshot();
        let mut candidates = vec![label];
        candidates.extend(aliases.iter().map(|alias| alias.trim()));
        for candidate in candidates.iter().filter(|value| !value.is_empty()) {
            if let Some(existing) = index.canonical_for(candidate)
                && existing != label
            {
                return Err(PapertagError::Conflict(format!(
                    "'{candidate}' already resolves to canonical label '{existing}'"
                )));
            }
        }

        let entry = next
            .get_mut(category)
            .ok_or_else(|| PapertagError::UnknownCategory(category.to_string()))?;
        let added_label = if entry.contains(label) {
            false
        } else {
            entry.canonical_tags.push(label.to_string());
            true
        };

        let mut added_aliases = Vec::new();
        let alias_values = aliases
            .iter()
            .map(|alias| alias.trim())
            .filter(|alias| !alias.is_empty() && lookup_key(alias) != lookup_key(label));
        for alias in alias_values {
            let known = entry.aliases.entry(label.to_string()).or_default();
            if !known.iter().any(|existing| existing == alias) {
                known.push(alias.to_string());
                added_aliases.push(alias.to_string());
            }
        }

        self.fs.write_document(VOCABULARY_FILE, &next)?;
        self.document = next;
        normalizer.rebuild(&self.document);
        debug!(category, label, added_label, aliases = added_aliases.len(), "vocabulary updated");

        Ok(VocabularyChange {
            category: category.to_string(),
            label: label.to_string(),
            added_label,
            added_aliases,
        })
    }
}
