use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub type Perspectives = IndexMap<String, String>;
pub type Distribution = IndexMap<String, usize>;

const DISTRIBUTION_SUFFIX: &str = "_distribution";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogDocument {
    #[serde(default)]
    pub papers: IndexMap<String, Record>,
    #[serde(default)]
    pub metadata: CatalogSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_perspectives")]
    pub perspectives: Perspectives,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecordDraft {
    #[serde(default, deserialize_with = "deserialize_perspectives")]
    pub perspectives: Perspectives,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RecordDraft {
    #[must_use]
    pub fn with_perspective(mut self, category: &str, label: &str) -> Self {
        self.perspectives
            .insert(category.to_string(), label.to_string());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspectives: Option<Perspectives>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RawCatalogSummary")]
pub struct CatalogSummary {
    pub total_papers: usize,
    pub last_updated: Option<String>,
    pub distributions: IndexMap<String, Distribution>,
}

impl CatalogSummary {
    #[must_use]
    pub fn distribution(&self, category: &str) -> Option<&Distribution> {
        self.distributions.get(category)
    }

    /// Compares counts only; `last_updated` is bookkeeping, not derived data.
    #[must_use]
    pub fn same_counts(&self, other: &Self) -> bool {
        self.total_papers == other.total_papers && self.distributions == other.distributions
    }
}

impl Serialize for CatalogSummary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2 + self.distributions.len()))?;
        map.serialize_entry("total_papers", &self.total_papers)?;
        map.serialize_entry("last_updated", &self.last_updated)?;
        for (category, distribution) in &self.distributions {
            map.serialize_entry(&format!("{category}{DISTRIBUTION_SUFFIX}"), distribution)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawCatalogSummary {
    #[serde(default)]
    total_papers: usize,
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(flatten)]
    rest: IndexMap<String, Value>,
}

impl TryFrom<RawCatalogSummary> for CatalogSummary {
    type Error = String;

    fn try_from(raw: RawCatalogSummary) -> Result<Self, Self::Error> {
        let mut distributions = IndexMap::new();
        for (key, value) in raw.rest {
            let Some(category) = key.strip_suffix(DISTRIBUTION_SUFFIX) else {
                continue;
            };
            let distribution = serde_json::from_value::<Distribution>(value)
                .map_err(|err| format!("invalid {key}: {err}"))?;
            distributions.insert(category.to_string(), distribution);
        }
        Ok(Self {
            total_papers: raw.total_papers,
            last_updated: raw.last_updated,
            distributions,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NovelLabelNotice {
    pub category: String,
    pub raw: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddRecordOutcome {
    pub paper_id: String,
    pub perspectives: Perspectives,
    pub novel_labels: Vec<NovelLabelNotice>,
    pub total_papers: usize,
    pub revision: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryDriftReport {
    pub consistent: bool,
    pub stored_total: usize,
    pub recomputed_total: usize,
    pub drifted_categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordChange {
    pub paper_id: String,
    pub category: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_papers: usize,
    pub last_updated: Option<String>,
    pub top_labels: IndexMap<String, Vec<(String, usize)>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenormalizeReport {
    pub examined: usize,
    pub changes: Vec<RecordChange>,
    pub persisted: bool,
}

// Perspective values arrive from hand-edited documents; anything that is not
// a string is kept as an empty (uncounted) value instead of failing the load.
fn deserialize_perspectives<'de, D>(deserializer: D) -> Result<Perspectives, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(category, value)| {
            let label = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
            };
            (category, label)
        })
        .collect())
}
