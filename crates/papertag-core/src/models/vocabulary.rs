use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type VocabularyDocument = IndexMap<String, CategoryVocabulary>;
pub type GroupDocument = IndexMap<String, TagGroup>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CategoryVocabulary {
    #[serde(default)]
    pub canonical_tags: Vec<String>,
    #[serde(default)]
    pub aliases: IndexMap<String, Vec<String>>,
}

impl CategoryVocabulary {
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.canonical_tags.iter().any(|tag| tag == label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagGroup {
    pub meta_tag: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupSuggestion {
    pub meta_tag: String,
    pub partner_meta_tag: String,
    pub tags: Vec<String>,
    pub count: usize,
}
