use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use serde_json::json;

use crate::cooccurrence::CooccurrenceAdvisor;
use crate::error::{PapertagError, Result};
use crate::groups::{GroupStore, GroupUpsert};
use crate::models::{GroupDocument, GroupSuggestion, TagGroup};

use super::Papertag;

impl Papertag {
    pub fn groups(&self) -> Result<GroupDocument> {
        Ok(self.read_groups()?.groups().clone())
    }

    pub fn group_tags(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.read_groups()?.get_group_tags(name))
    }

    pub fn tag_group(&self, label: &str) -> Result<Option<String>> {
        Ok(self.read_groups()?.get_tag_group(label))
    }

    pub fn related_tags(&self, label: &str) -> Result<Vec<String>> {
        Ok(self.read_groups()?.get_related_tags(label))
    }

    pub fn create_or_update_group(&self, request: GroupUpsert) -> Result<TagGroup> {
        let target = request.name.trim().to_string();
        self.logged(
            "group.upsert",
            Some(target),
            || {
                let vocabulary = self.read_vocabulary()?;
                self.write_groups()?
                    .create_or_update_group(request, &vocabulary)
            },
            |group| Some(json!({ "meta_tag": &group.meta_tag, "members": group.tags.len() })),
            |_| None,
        )
    }

    /// Read-only. `threshold` defaults to the configured minimum and `limit`
    /// truncates after sorting.
    pub fn suggest_groups(
        &self,
        threshold: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<GroupSuggestion>> {
        let threshold = threshold.unwrap_or(self.config.min_cooccurrence);
        let advisor = CooccurrenceAdvisor::new(
            self.categories()?,
            self.config.primary_category.clone(),
        );
        let records = self.catalog.records()?;
        let mut suggestions = advisor.suggest(records.values(), threshold);
        if let Some(limit) = limit {
            suggestions.truncate(limit);
        }
        Ok(suggestions)
    }

    /// The only path from a suggestion into the group store.
    pub fn accept_suggestion(
        &self,
        suggestion: &GroupSuggestion,
        name: &str,
        display_name: Option<&str>,
        description: Option<&str>,
    ) -> Result<TagGroup> {
        let display_name = display_name.map_or_else(
            || suggestion.tags.join(" + "),
            ToString::to_string,
        );
        self.create_or_update_group(GroupUpsert {
            name: name.to_string(),
            category: suggestion.meta_tag.clone(),
            labels: suggestion.tags.clone(),
            display_name,
            description: description.unwrap_or_default().to_string(),
        })
    }

    pub(super) fn read_groups(&self) -> Result<RwLockReadGuard<'_, GroupStore>> {
        self.groups
            .read()
            .map_err(|_| PapertagError::lock_poisoned("groups"))
    }

    fn write_groups(&self) -> Result<RwLockWriteGuard<'_, GroupStore>> {
        self.groups
            .write()
            .map_err(|_| PapertagError::lock_poisoned("groups"))
    }
}
