use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PapertagError, Result};
use crate::fs::{DocumentFs, GROUPS_FILE};
use crate::models::{GroupDocument, TagGroup};
use crate::vocabulary::VocabularyStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupUpsert {
    pub name: String,
    pub category: String,
    pub labels: Vec<String>,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct GroupStore {
    fs: DocumentFs,
    document: GroupDocument,
}

impl GroupStore {
    pub fn load_or_default(fs: DocumentFs) -> Result<Self> {
        let document = fs
            .read_document::<GroupDocument>(GROUPS_FILE)?
            .unwrap_or_default();
        Ok(Self { fs, document })
    }

    pub fn persist_if_missing(&self) -> Result<bool> {
        if self.fs.read_optional(GROUPS_FILE)?.is_some() {
            return Ok(false);
        }
        self.fs.write_document(GROUPS_FILE, &self.document)?;
        Ok(true)
    }

    #[must_use]
    pub fn groups(&self) -> &GroupDocument {
        &self.document
    }

    #[must_use]
    pub fn get_group(&self, name: &str) -> Option<&TagGroup> {
        self.document.get(name)
    }

    #[must_use]
    pub fn get_group_tags(&self, name: &str) -> Vec<String> {
        self.document
            .get(name)
            .map(|group| group.tags.clone())
            .unwrap_or_default()
    }

    /// Membership is exclusive (enforced on write), so at most one group can
    /// match.
    #[must_use]
    pub fn get_tag_group(&self, label: &str) -> Option<String> {
        owning_group(&self.document, label, None).map(ToString::to_string)
    }

    #[must_use]
    pub fn get_related_tags(&self, label: &str) -> Vec<String> {
        self.get_tag_group(label)
            .map(|name| {
                self.get_group_tags(&name)
                    .into_iter()
                    .filter(|member| member != label)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn create_or_update_group(
        &mut self,
        request: GroupUpsert,
        vocabulary: &VocabularyStore,
    ) -> Result<TagGroup> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(PapertagError::Validation(
                "group name must not be empty".to_string(),
            ));
        }
        vocabulary.require_category(&request.category)?;
        let labels = dedup_labels(&request.labels);

        let _lock = self.fs.lock_exclusive(GROUPS_FILE)?;
        let mut next = self
            .fs
            .read_document::<GroupDocument>(GROUPS_FILE)?
            .unwrap_or_else(|| self.document.clone());

        for label in &labels {
            if let Some(other) = owning_group(&next, label, Some(name.as_str())) {
                return Err(PapertagError::Conflict(format!(
                    "label '{label}' already belongs to group '{other}'"
                )));
            }
        }

        let group = TagGroup {
            meta_tag: request.category,
            display_name: request.display_name,
            description: request.description,
            tags: labels,
        };
        let replaced = next.insert(name.clone(), group.clone()).is_some();

        self.fs.write_document(GROUPS_FILE, &next)?;
        self.document = next;
        debug!(group = %name, replaced, members = group.tags.len(), "group upserted");
        Ok(group)
    }
}

fn owning_group<'a>(
    document: &'a GroupDocument,
    label: &str,
    skip: Option<&str>,
) -> Option<&'a str> {
    document
        .iter()
        .filter(|(name, _)| Some(name.as_str()) != skip)
        .find(|(_, group)| group.tags.iter().any(|member| member == label))
        .map(|(name, _)| name.as_str())
}

fn dedup_labels(labels: &[String]) -> Vec<String> {
    let mut out = Vec::<String>::with_capacity(labels.len());
    for label in labels.iter().map(|label| label.trim()) {
        if !label.is_empty() && !out.iter().any(|existing| existing == label) {
            out.push(label.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn upsert(name: &str, category: &str, labels: &[&str]) -> GroupUpsert {
        GroupUpsert {
            name: name.to_string(),
            category: category.to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
            display_name: name.to_uppercase(),
            description: String::new(),
        }
    }

    fn open(root: &std::path::Path) -> (GroupStore, VocabularyStore) {
        let fs = DocumentFs::new(root);
        (
            GroupStore::load_or_default(fs.clone()).expect("groups"),
            VocabularyStore::load_or_default(fs).expect("vocabulary"),
        )
    }

    #[test]
    fn unknown_group_has_no_tags() {
        let temp = tempdir().expect("tempdir");
        let (groups, _) = open(temp.path());
        assert!(groups.get_group_tags("missing").is_empty());
        assert_eq!(groups.get_tag_group("stroke"), None);
    }

    #[test]
    fn create_group_collapses_duplicates_and_persists_in_insertion_order() {
        let temp = tempdir().expect("tempdir");
        let (mut groups, vocabulary) = open(temp.path());
        groups
            .create_or_update_group(
                upsert("neuro", "disease", &["stroke", "stroke", " parkinsons "]),
                &vocabulary,
            )
            .expect("neuro");
        groups
            .create_or_update_group(upsert("ortho", "disease", &["fracture"]), &vocabulary)
            .expect("ortho");

        let reloaded = GroupStore::load_or_default(DocumentFs::new(temp.path())).expect("reload");
        let names = reloaded.groups().keys().cloned().collect::<Vec<_>>();
        assert_eq!(names, vec!["neuro", "ortho"]);
        assert_eq!(reloaded.get_group_tags("neuro"), vec!["stroke", "parkinsons"]);
        assert_eq!(reloaded.get_tag_group("parkinsons").as_deref(), Some("neuro"));
        assert_eq!(reloaded.get_related_tags("stroke"), vec!["parkinsons"]);
    }

    #[test]
    fn upsert_overwrites_existing_group_of_same_name() {
        let temp = tempdir().expect("tempdir");
        let (mut groups, vocabulary) = open(temp.path());
        groups
            .create_or_update_group(upsert("neuro", "disease", &["stroke"]), &vocabulary)
            .expect("first");
        groups
            .create_or_update_group(upsert("neuro", "disease", &["stroke", "ms"]), &vocabulary)
            .expect("second");
        assert_eq!(groups.groups().len(), 1);
        assert_eq!(groups.get_group_tags("neuro"), vec!["stroke", "ms"]);
    }

    #[test]
    fn label_cannot_join_a_second_group() {
        let temp = tempdir().expect("tempdir");
        let (mut groups, vocabulary) = open(temp.path());
        groups
            .create_or_update_group(upsert("neuro", "disease", &["stroke"]), &vocabulary)
            .expect("neuro");
        let err = groups
            .create_or_update_group(upsert("vascular", "disease", &["stroke"]), &vocabulary)
            .expect_err("conflict");
        assert!(matches!(err, PapertagError::Conflict(_)));
        assert!(groups.get_group("vascular").is_none());
    }

    #[test]
    fn group_category_must_be_declared() {
        let temp = tempdir().expect("tempdir");
        let (mut groups, vocabulary) = open(temp.path());
        let err = groups
            .create_or_update_group(upsert("misc", "genre", &["x"]), &vocabulary)
            .expect_err("unknown category");
        assert!(matches!(err, PapertagError::UnknownCategory(_)));
    }
}
