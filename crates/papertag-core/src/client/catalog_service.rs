use indexmap::IndexMap;
use serde_json::json;

use crate::catalog::{DraftFormat, parse_record_draft, rank_labels};
use crate::error::Result;
use crate::models::{
    AddRecordOutcome, CatalogStats, CatalogSummary, Record, RecordDraft, RecordPatch,
    RenormalizeReport, SummaryDriftReport,
};

use super::Papertag;

impl Papertag {
    pub fn add_record(&self, draft: RecordDraft) -> Result<AddRecordOutcome> {
        self.logged(
            "catalog.add_record",
            None,
            || self.catalog.add_record(draft, &self.normalizer),
            |outcome| {
                Some(json!({
                    "paper_id": &outcome.paper_id,
                    "total_papers": outcome.total_papers,
                    "revision": &outcome.revision,
                    "novel_labels": &outcome.novel_labels,
                }))
            },
            |outcome| {
                (!outcome.novel_labels.is_empty()).then(|| {
                    format!(
                        "{} label(s) not in vocabulary",
                        outcome.novel_labels.len()
                    )
                })
            },
        )
    }

    pub fn add_record_from_str(&self, raw: &str, format: DraftFormat) -> Result<AddRecordOutcome> {
        let draft = parse_record_draft(raw, format)?;
        self.add_record(draft)
    }

    pub fn update_record(&self, paper_id: &str, patch: RecordPatch) -> Result<Record> {
        self.logged(
            "catalog.update_record",
            Some(paper_id.to_string()),
            || self.catalog.update_record(paper_id, patch, &self.normalizer),
            |record| Some(json!({ "perspectives": &record.perspectives })),
            |_| None,
        )
    }

    pub fn record(&self, paper_id: &str) -> Result<Record> {
        self.catalog.get_record(paper_id)
    }

    pub fn records(&self) -> Result<IndexMap<String, Record>> {
        self.catalog.records()
    }

    pub fn summary(&self) -> Result<CatalogSummary> {
        self.catalog.summary()
    }

    pub fn top_labels(&self, category: &str, limit: usize) -> Result<Vec<(String, usize)>> {
        self.catalog.top_labels(category, limit)
    }

    /// Top `limit` labels for every declared category.
    pub fn catalog_stats(&self, limit: usize) -> Result<CatalogStats> {
        let summary = self.catalog.summary()?;
        let top_labels = self
            .catalog
            .categories()
            .iter()
            .map(|category| {
                let ranked = summary
                    .distribution(category)
                    .map(|distribution| rank_labels(distribution, limit))
                    .unwrap_or_default();
                (category.clone(), ranked)
            })
            .collect::<IndexMap<_, _>>();
        Ok(CatalogStats {
            total_papers: summary.total_papers,
            last_updated: summary.last_updated,
            top_labels,
        })
    }

    pub fn verify_summary(&self) -> Result<SummaryDriftReport> {
        self.catalog.verify_summary()
    }

    pub fn rebuild_summary(&self) -> Result<CatalogSummary> {
        self.logged(
            "catalog.rebuild_summary",
            None,
            || self.catalog.rebuild_summary(),
            |summary| Some(json!({ "total_papers": summary.total_papers })),
            |_| None,
        )
    }

    pub fn renormalize_records(&self, apply: bool) -> Result<RenormalizeReport> {
        if !apply {
            return self.catalog.renormalize_records(&self.normalizer, false);
        }
        self.logged(
            "catalog.renormalize",
            None,
            || self.catalog.renormalize_records(&self.normalizer, true),
            |report| {
                Some(json!({
                    "examined": report.examined,
                    "changed": report.changes.len(),
                }))
            },
            |_| None,
        )
    }
}
