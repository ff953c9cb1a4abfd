use indexmap::IndexMap;

use crate::models::{GroupSuggestion, Record, is_countable};

pub const DEFAULT_PRIMARY_CATEGORY: &str = "study_type";
pub const DEFAULT_MIN_COOCCURRENCE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey {
    category: String,
    label: String,
    partner_label: String,
}

#[derive(Debug)]
struct PairCount {
    partner_category: String,
    count: usize,
}

/// Mines pairwise label co-occurrence across records. Read-only: suggestions
/// only reach the group store through an explicit accept step.
#[derive(Debug, Clone)]
pub struct CooccurrenceAdvisor {
    categories: Vec<String>,
    primary_category: String,
}

impl CooccurrenceAdvisor {
    #[must_use]
    pub fn new(categories: Vec<String>, primary_category: impl Into<String>) -> Self {
        Self {
            categories,
            primary_category: primary_category.into(),
        }
    }

    #[must_use]
    pub fn primary_category(&self) -> &str {
        &self.primary_category
    }

    pub fn suggest<'a, I>(&self, records: I, threshold: usize) -> Vec<GroupSuggestion>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut counts = IndexMap::<PairKey, PairCount>::new();
        for record in records {
            let entries = self.ordered_entries(record);
            for (i, (category, label)) in entries.iter().enumerate() {
                for (partner_category, partner_label) in &entries[i + 1..] {
                    let key = PairKey {
                        category: (*category).to_string(),
                        label: (*label).to_string(),
                        partner_label: (*partner_label).to_string(),
                    };
                    // Keyed on the labels only; the partner category is the first one seen.
                    counts
                        .entry(key)
                        .or_insert_with(|| PairCount {
                            partner_category: (*partner_category).to_string(),
                            count: 0,
                        })
                        .count += 1;
                }
            }
        }

        let mut suggestions = counts
            .into_iter()
            .filter(|(_, pair)| pair.count >= threshold)
            .map(|(key, pair)| GroupSuggestion {
                meta_tag: key.category,
                partner_meta_tag: pair.partner_category,
                tags: vec![key.label, key.partner_label],
                count: pair.count,
            })
            .collect::<Vec<_>>();
        // Stable: equal counts keep first-encountered order.
        suggestions.sort_by(|a, b| b.count.cmp(&a.count));
        suggestions
    }

    // Declared categories first (vocabulary order), then any extra keys in
    // the order the record lists them.
    fn ordered_entries<'r>(&self, record: &'r Record) -> Vec<(&'r str, &'r str)> {
        let declared = self
            .categories
            .iter()
            .filter_map(|category| record.perspectives.get_key_value(category.as_str()));
        let extra = record
            .perspectives
            .iter()
            .filter(|(category, _)| !self.categories.iter().any(|known| known == *category));
        declared
            .chain(extra)
            .filter(|(category, label)| {
                category.as_str() != self.primary_category && is_countable(label)
            })
            .map(|(category, label)| (category.as_str(), label.trim()))
            .collect()
    }
}
