mod catalog;
mod normalize;
mod trace;
mod vocabulary;

pub use catalog::{
    AddRecordOutcome, CatalogDocument, CatalogStats, CatalogSummary, Distribution,
    NovelLabelNotice, Perspectives, Record, RecordChange, RecordDraft, RecordPatch,
    RenormalizeReport, SummaryDriftReport,
};
pub use normalize::{Resolution, ResolutionKind, ValidationReason, ValidationResult};
pub use trace::RequestLogEntry;
pub use vocabulary::{
    CategoryVocabulary, GroupDocument, GroupSuggestion, TagGroup, VocabularyDocument,
};

pub const NOT_APPLICABLE: &str = "not_applicable";
pub const UNKNOWN: &str = "unknown";

#[must_use]
pub fn is_sentinel(label: &str) -> bool {
    matches!(label, NOT_APPLICABLE | UNKNOWN)
}

/// Present in the sense the summary and co-occurrence counters use:
/// non-empty after trimming and not a sentinel.
#[must_use]
pub fn is_countable(label: &str) -> bool {
    let trimmed = label.trim();
    !trimmed.is_empty() && !is_sentinel(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_and_blanks_are_not_countable() {
        assert!(!is_countable(""));
        assert!(!is_countable("   "));
        assert!(!is_countable(NOT_APPLICABLE));
        assert!(!is_countable(UNKNOWN));
        assert!(is_countable("stroke"));
    }
}
