use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{PapertagError, Result};
use crate::fs::{CATALOG_FILE, DocumentFs};
use crate::models::{
    AddRecordOutcome, CatalogDocument, CatalogSummary, Distribution, Record, RecordChange,
    RecordDraft, RecordPatch, RenormalizeReport, SummaryDriftReport, is_countable,
};
use crate::normalize::TagNormalizer;

pub const DEFAULT_ID_PREFIX: &str = "paper";
const ID_BASELINE: u64 = 1;
const ID_WIDTH: usize = 3;
const RESERVED_FIELDS: [&str; 4] = ["paper_id", "perspectives", "date_added", "date_modified"];

/// Pure full rebuild: every declared category gets a table, even an empty
/// one. Sentinels and blanks are not counted.
pub fn recompute_summary<'a, I>(records: I, categories: &[String]) -> CatalogSummary
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut distributions = categories
        .iter()
        .map(|category| (category.clone(), Distribution::new()))
        .collect::<IndexMap<_, _>>();
    let mut total_papers = 0usize;
    for record in records {
        total_papers += 1;
        for (category, distribution) in &mut distributions {
            let Some(label) = record.perspectives.get(category.as_str()) else {
                continue;
            };
            if is_countable(label) {
                *distribution.entry(label.trim().to_string()).or_insert(0) += 1;
            }
        }
    }
    CatalogSummary {
        total_papers,
        last_updated: None,
        distributions,
    }
}

/// Descending by count; equal counts keep distribution order.
#[must_use]
pub fn rank_labels(distribution: &Distribution, limit: usize) -> Vec<(String, usize)> {
    let mut ranked = distribution
        .iter()
        .map(|(label, count)| (label.clone(), *count))
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

pub fn next_record_id<'a, I>(existing: I, prefix: &str) -> Result<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let max = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max();
    let next = match max {
        None => ID_BASELINE,
        Some(value) => value.checked_add(1).ok_or_else(|| {
            PapertagError::Validation(format!("record id space exhausted for prefix '{prefix}'"))
        })?,
    };
    Ok(format!("{prefix}{next:0width$}", width = ID_WIDTH))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftFormat {
    Json,
    Yaml,
}

impl DraftFormat {
    /// `.yaml`/`.yml` read as YAML, everything else as JSON.
    #[must_use]
    pub fn from_path(path: &std::path::Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

pub fn parse_record_draft(raw: &str, format: DraftFormat) -> Result<RecordDraft> {
    match format {
        DraftFormat::Json => Ok(serde_json::from_str(raw)?),
        DraftFormat::Yaml => Ok(serde_norway::from_str(raw)?),
    }
}

#[must_use]
pub fn document_revision(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Owns `catalog.json`. Every mutation re-reads the document under an
/// exclusive lock, rebuilds the summary from all records and writes the
/// whole document back in one atomic replace.
#[derive(Debug)]
pub struct CatalogEngine {
    fs: DocumentFs,
    categories: Vec<String>,
    id_prefix: String,
    gate: Mutex<()>,
}

impl CatalogEngine {
    #[must_use]
    pub fn new(fs: DocumentFs, categories: Vec<String>, id_prefix: impl Into<String>) -> Self {
        Self {
            fs,
            categories,
            id_prefix: id_prefix.into(),
            gate: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn load(&self) -> Result<CatalogDocument> {
        match self.fs.read_document::<CatalogDocument>(CATALOG_FILE)? {
            Some(document) => Ok(document),
            None => Ok(CatalogDocument {
                papers: IndexMap::new(),
                metadata: recompute_summary([], &self.categories),
            }),
        }
    }

    pub fn persist_if_missing(&self) -> Result<bool> {
        if self.fs.read_optional(CATALOG_FILE)?.is_some() {
            return Ok(false);
        }
        self.transaction(|document| {
            document.metadata = self.stamped_summary(&document.papers);
            Ok(())
        })?;
        Ok(true)
    }

    pub fn revision(&self) -> Result<Option<String>> {
        Ok(self
            .fs
            .read_optional(CATALOG_FILE)?
            .map(|content| document_revision(&content)))
    }

    pub fn records(&self) -> Result<IndexMap<String, Record>> {
        Ok(self.load()?.papers)
    }

    pub fn get_record(&self, paper_id: &str) -> Result<Record> {
        self.load()?
            .papers
            .shift_remove(paper_id)
            .ok_or_else(|| PapertagError::NotFound(format!("record {paper_id}")))
    }

    pub fn summary(&self) -> Result<CatalogSummary> {
        Ok(self.load()?.metadata)
    }

    pub fn add_record(
        &self,
        draft: RecordDraft,
        normalizer: &TagNormalizer,
    ) -> Result<AddRecordOutcome> {
        let normalized = normalizer.normalize_perspectives(&draft.perspectives)?;
        let mut fields = draft.fields;
        for reserved in RESERVED_FIELDS {
            fields.remove(reserved);
        }

        let (paper_id, total_papers, revision) = self.transaction(|document| {
            let paper_id = next_record_id(document.papers.keys(), &self.id_prefix)?;
            let now = Utc::now().to_rfc3339();
            let record = Record {
                paper_id: Some(paper_id.clone()),
                perspectives: normalized.values.clone(),
                date_added: Some(now.clone()),
                date_modified: Some(now),
                fields,
            };
            document.papers.insert(paper_id.clone(), record);
            document.metadata = self.stamped_summary(&document.papers);
            Ok((paper_id, document.metadata.total_papers))
        })
        .map(|((paper_id, total), revision)| (paper_id, total, revision))?;

        debug!(paper_id = %paper_id, total_papers, novel = normalized.novel.len(), "record added");
        Ok(AddRecordOutcome {
            paper_id,
            perspectives: normalized.values,
            novel_labels: normalized.novel,
            total_papers,
            revision,
        })
    }

    pub fn update_record(
        &self,
        paper_id: &str,
        patch: RecordPatch,
        normalizer: &TagNormalizer,
    ) -> Result<Record> {
        let perspectives = patch
            .perspectives
            .as_ref()
            .map(|raw| normalizer.normalize_perspectives(raw))
            .transpose()?;

        let (record, _) = self.transaction(|document| {
            let record = document
                .papers
                .get_mut(paper_id)
                .ok_or_else(|| PapertagError::NotFound(format!("record {paper_id}")))?;
            if let Some(normalized) = perspectives {
                record.perspectives.extend(normalized.values);
            }
            for (key, value) in patch.fields {
                if RESERVED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                if value.is_null() {
                    record.fields.remove(&key);
                } else {
                    record.fields.insert(key, value);
                }
            }
            record.date_modified = Some(Utc::now().to_rfc3339());
            let updated = record.clone();
            document.metadata = self.stamped_summary(&document.papers);
            Ok(updated)
        })?;
        Ok(record)
    }

    pub fn verify_summary(&self) -> Result<SummaryDriftReport> {
        let document = self.load()?;
        let recomputed = recompute_summary(document.papers.values(), &self.categories);
        let stored = &document.metadata;

        let mut drifted_categories = Vec::new();
        for category in &self.categories {
            let empty = Distribution::new();
            let expected = recomputed.distribution(category).unwrap_or(&empty);
            let actual = stored.distribution(category).unwrap_or(&empty);
            if expected != actual {
                drifted_categories.push(category.clone());
            }
        }
        let consistent =
            drifted_categories.is_empty() && stored.total_papers == recomputed.total_papers;
        Ok(SummaryDriftReport {
            consistent,
            stored_total: stored.total_papers,
            recomputed_total: recomputed.total_papers,
            drifted_categories,
        })
    }

    pub fn rebuild_summary(&self) -> Result<CatalogSummary> {
        let (summary, _) = self.transaction(|document| {
            document.metadata = self.stamped_summary(&document.papers);
            Ok(document.metadata.clone())
        })?;
        Ok(summary)
    }

    /// Re-runs normalization over stored records against the current
    /// vocabulary. With `apply == false` nothing is written.
    pub fn renormalize_records(
        &self,
        normalizer: &TagNormalizer,
        apply: bool,
    ) -> Result<RenormalizeReport> {
        if !apply {
            let document = self.load()?;
            let changes = collect_changes(&document, normalizer);
            return Ok(RenormalizeReport {
                examined: document.papers.len(),
                changes,
                persisted: false,
            });
        }

        let (report, _) = self.transaction(|document| {
            let changes = collect_changes(document, normalizer);
            for change in &changes {
                if let Some(record) = document.papers.get_mut(&change.paper_id) {
                    record
                        .perspectives
                        .insert(change.category.clone(), change.to.clone());
                    record.date_modified = Some(Utc::now().to_rfc3339());
                }
            }
            document.metadata = self.stamped_summary(&document.papers);
            Ok(RenormalizeReport {
                examined: document.papers.len(),
                persisted: true,
                changes,
            })
        })?;
        Ok(report)
    }

    pub fn top_labels(&self, category: &str, limit: usize) -> Result<Vec<(String, usize)>> {
        if !self.categories.iter().any(|known| known == category) {
            return Err(PapertagError::UnknownCategory(category.to_string()));
        }
        let summary = self.summary()?;
        Ok(summary
            .distribution(category)
            .map(|distribution| rank_labels(distribution, limit))
            .unwrap_or_default())
    }

    fn stamped_summary(&self, papers: &IndexMap<String, Record>) -> CatalogSummary {
        let mut summary = recompute_summary(papers.values(), &self.categories);
        summary.last_updated = Some(Utc::now().to_rfc3339());
        summary
    }

    // Nothing reaches disk unless `mutate` succeeds; the lock guards are
    // released on every return path.
    fn transaction<T, F>(&self, mutate: F) -> Result<(T, String)>
    where
        F: FnOnce(&mut CatalogDocument) -> Result<T>,
    {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.fs.lock_exclusive(CATALOG_FILE)?;
        let mut document = self.load()?;
        let output = mutate(&mut document)?;

        let mut content = serde_json::to_string_pretty(&document)?;
        content.push('\n');
        self.fs.write_atomic(CATALOG_FILE, &content)?;
        Ok((output, document_revision(&content)))
    }
}

fn collect_changes(document: &CatalogDocument, normalizer: &TagNormalizer) -> Vec<RecordChange> {
    let mut changes = Vec::new();
    for (paper_id, record) in &document.papers {
        let normalized = normalizer.normalize_many(&record.perspectives);
        for (category, to) in normalized {
            let from = record
                .perspectives
                .get(&category)
                .cloned()
                .unwrap_or_default();
            if from != to {
                changes.push(RecordChange {
                    paper_id: paper_id.clone(),
                    category,
                    from,
                    to,
                });
            }
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryVocabulary, Perspectives, VocabularyDocument};
    use crate::normalize::NormalizationPolicy;
    use serde_json::json;
    use tempfile::tempdir;

    fn categories() -> Vec<String> {
        ["study_type", "disease", "method", "analysis", "population"]
            .map(String::from)
            .to_vec()
    }

    fn normalizer() -> TagNormalizer {
        let mut vocabulary = VocabularyDocument::new();
        vocabulary.insert(
            "disease".to_string(),
            CategoryVocabulary {
                canonical_tags: vec!["stroke".to_string(), "parkinsons".to_string()],
                aliases: IndexMap::from([("stroke".to_string(), vec!["CVA".to_string()])]),
            },
        );
        TagNormalizer::new(&vocabulary, NormalizationPolicy::default())
    }

    fn draft(disease: &str) -> RecordDraft {
        RecordDraft::default()
            .with_perspective("disease", disease)
            .with_field("title", format!("paper about {disease}"))
    }

    #[test]
    fn empty_corpus_summary_has_zero_total_and_empty_tables() {
        let summary = recompute_summary([], &categories());
        assert_eq!(summary.total_papers, 0);
        assert_eq!(summary.distributions.len(), 5);
        assert!(summary.distributions.values().all(IndexMap::is_empty));
    }

    #[test]
    fn summary_counts_labels_and_skips_sentinels() {
        let records = [
            ("stroke", "gait"),
            ("stroke", "not_applicable"),
            ("parkinsons", ""),
        ]
        .map(|(disease, method)| Record {
            perspectives: Perspectives::from([
                ("disease".to_string(), disease.to_string()),
                ("method".to_string(), method.to_string()),
            ]),
            ..Record::default()
        });
        let summary = recompute_summary(&records, &categories());
        assert_eq!(summary.total_papers, 3);
        assert_eq!(
            summary.distribution("disease"),
            Some(&IndexMap::from([
                ("stroke".to_string(), 2),
                ("parkinsons".to_string(), 1)
            ]))
        );
        assert_eq!(
            summary.distribution("method"),
            Some(&IndexMap::from([("gait".to_string(), 1)]))
        );
        assert_eq!(summary.distribution("population"), Some(&IndexMap::new()));
    }

    #[test]
    fn next_record_id_uses_max_numeric_suffix() {
        let none: Vec<String> = Vec::new();
        assert_eq!(next_record_id(&none, "paper").expect("id"), "paper001");

        let ids = ["paper002", "paper010", "paperX", "other999"].map(String::from);
        assert_eq!(next_record_id(&ids, "paper").expect("id"), "paper011");

        let wide = ["paper999".to_string()];
        assert_eq!(next_record_id(&wide, "paper").expect("id"), "paper1000");
    }

    #[test]
    fn next_record_id_rejects_exhausted_suffix() {
        let ids = [format!("paper{}", u64::MAX)];
        let err = next_record_id(&ids, "paper").expect_err("overflow");
        assert!(matches!(err, PapertagError::Validation(_)));
    }

    #[test]
    fn add_record_normalizes_assigns_id_and_persists_summary() {
        let temp = tempdir().expect("tempdir");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        let normalizer = normalizer();

        let first = engine.add_record(draft("CVA"), &normalizer).expect("first");
        let second = engine.add_record(draft("stroke"), &normalizer).expect("second");
        let third = engine
            .add_record(draft("Parkinsons"), &normalizer)
            .expect("third");

        assert_eq!(first.paper_id, "paper001");
        assert_eq!(second.paper_id, "paper002");
        assert_eq!(third.paper_id, "paper003");
        assert_eq!(first.perspectives["disease"], "stroke");
        assert_eq!(third.total_papers, 3);
        assert_eq!(engine.revision().expect("revision"), Some(third.revision));

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(temp.path().join(CATALOG_FILE)).expect("read"),
        )
        .expect("json");
        assert_eq!(raw["metadata"]["total_papers"], 3);
        assert_eq!(
            raw["metadata"]["disease_distribution"],
            json!({"stroke": 2, "parkinsons": 1})
        );
        assert_eq!(raw["papers"]["paper001"]["title"], "paper about CVA");
        assert!(raw["metadata"]["last_updated"].is_string());
    }

    #[test]
    fn add_record_reports_novel_labels_without_blocking() {
        let temp = tempdir().expect("tempdir");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        let outcome = engine
            .add_record(
                draft("stroke").with_perspective("method", "Gait Analysis!!"),
                &normalizer(),
            )
            .expect("add");
        assert_eq!(outcome.perspectives["method"], "gait_analysis");
        assert_eq!(outcome.novel_labels.len(), 1);
        assert_eq!(outcome.novel_labels[0].category, "method");
    }

    #[test]
    fn rejected_record_leaves_document_untouched() {
        let temp = tempdir().expect("tempdir");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        let normalizer = normalizer();
        engine.add_record(draft("stroke"), &normalizer).expect("seed");
        let before = engine.revision().expect("revision");

        let strict = TagNormalizer::new(
            &VocabularyDocument::new(),
            NormalizationPolicy {
                reject_unknown: true,
            },
        );
        let err = engine
            .add_record(draft("ataxia"), &strict)
            .expect_err("strict policy");
        assert!(matches!(err, PapertagError::NovelLabel { .. }));
        assert_eq!(engine.revision().expect("revision"), before);
        assert_eq!(engine.records().expect("records").len(), 1);
    }

    #[test]
    fn reserved_fields_in_draft_cannot_override_identity() {
        let temp = tempdir().expect("tempdir");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        let outcome = engine
            .add_record(
                draft("stroke")
                    .with_field("paper_id", "paper777")
                    .with_field("date_added", "yesterday"),
                &normalizer(),
            )
            .expect("add");
        assert_eq!(outcome.paper_id, "paper001");
        let record = engine.get_record("paper001").expect("get");
        assert_ne!(record.date_added.as_deref(), Some("yesterday"));
        assert!(!record.fields.contains_key("paper_id"));
    }

    #[test]
    fn update_record_rebuilds_summary_without_stale_counts() {
        let temp = tempdir().expect("tempdir");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        let normalizer = normalizer();
        engine.add_record(draft("stroke"), &normalizer).expect("add");

        let patch = RecordPatch {
            perspectives: Some(Perspectives::from([(
                "disease".to_string(),
                "parkinsons".to_string(),
            )])),
            fields: serde_json::Map::from_iter([("title".to_string(), serde_json::Value::Null)]),
        };
        let updated = engine
            .update_record("paper001", patch, &normalizer)
            .expect("update");
        assert_eq!(updated.perspectives["disease"], "parkinsons");
        assert!(!updated.fields.contains_key("title"));

        let summary = engine.summary().expect("summary");
        assert_eq!(
            summary.distribution("disease"),
            Some(&IndexMap::from([("parkinsons".to_string(), 1)]))
        );

        let err = engine
            .update_record("paper404", RecordPatch::default(), &normalizer)
            .expect_err("missing");
        assert!(matches!(err, PapertagError::NotFound(_)));
    }

    #[test]
    fn verify_detects_hand_edited_summary_and_rebuild_repairs_it() {
        let temp = tempdir().expect("tempdir");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        engine
            .add_record(draft("stroke"), &normalizer())
            .expect("add");
        assert!(engine.verify_summary().expect("verify").consistent);

        let path = temp.path().join(CATALOG_FILE);
        let mut raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        raw["metadata"]["disease_distribution"] = json!({"stroke": 5});
        std::fs::write(&path, raw.to_string()).expect("write");

        let report = engine.verify_summary().expect("verify");
        assert!(!report.consistent);
        assert_eq!(report.drifted_categories, vec!["disease"]);

        engine.rebuild_summary().expect("rebuild");
        assert!(engine.verify_summary().expect("verify").consistent);
    }

    #[test]
    fn renormalize_applies_current_vocabulary_to_old_records() {
        let temp = tempdir().expect("tempdir");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        let empty = TagNormalizer::new(&VocabularyDocument::new(), NormalizationPolicy::default());
        engine.add_record(draft("CVA"), &empty).expect("add");
        assert_eq!(
            engine.get_record("paper001").expect("get").perspectives["disease"],
            "cva"
        );

        let normalizer = normalizer();
        let dry = engine
            .renormalize_records(&normalizer, false)
            .expect("dry run");
        assert_eq!(dry.changes.len(), 1);
        assert!(!dry.persisted);
        assert_eq!(
            engine.get_record("paper001").expect("get").perspectives["disease"],
            "cva"
        );

        let applied = engine.renormalize_records(&normalizer, true).expect("apply");
        assert_eq!(applied.changes[0].to, "stroke");
        assert_eq!(
            engine.summary().expect("summary").distribution("disease"),
            Some(&IndexMap::from([("stroke".to_string(), 1)]))
        );
    }

    #[test]
    fn top_labels_ranks_by_count_and_rejects_unknown_category() {
        let temp = tempdir().expect("tempdir");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        let normalizer = normalizer();
        for disease in ["parkinsons", "stroke", "stroke"] {
            engine.add_record(draft(disease), &normalizer).expect("add");
        }
        let top = engine.top_labels("disease", 1).expect("top");
        assert_eq!(top, vec![("stroke".to_string(), 2)]);
        assert!(matches!(
            engine.top_labels("genre", 3),
            Err(PapertagError::UnknownCategory(_))
        ));
    }

    #[test]
    fn yaml_and_json_drafts_parse_to_the_same_shape() {
        let yaml = "title: Gait after stroke\nyear: 2021\nperspectives:\n  disease: CVA\n  method: null\n";
        let json = r#"{"title":"Gait after stroke","year":2021,"perspectives":{"disease":"CVA","method":null}}"#;
        let from_yaml = parse_record_draft(yaml, DraftFormat::Yaml).expect("yaml");
        let from_json = parse_record_draft(json, DraftFormat::Json).expect("json");
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.perspectives["method"], "");
        assert_eq!(
            DraftFormat::from_path(std::path::Path::new("paper.YML")),
            DraftFormat::Yaml
        );
        assert!(parse_record_draft("perspectives: [", DraftFormat::Yaml).is_err());
    }

    #[test]
    fn malformed_catalog_fails_to_load() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join(CATALOG_FILE), "{\"papers\": 7}").expect("write");
        let engine = CatalogEngine::new(DocumentFs::new(temp.path()), categories(), "paper");
        assert!(matches!(
            engine.load(),
            Err(PapertagError::MalformedDocument { .. })
        ));
    }
}
