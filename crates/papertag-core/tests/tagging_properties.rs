use indexmap::IndexMap;
use papertag_core::catalog::recompute_summary;
use papertag_core::cooccurrence::CooccurrenceAdvisor;
use papertag_core::models::{
    CategoryVocabulary, Perspectives, Record, RecordDraft, ResolutionKind, VocabularyDocument,
    is_countable,
};
use papertag_core::vocabulary::DEFAULT_CATEGORIES;
use papertag_core::{NormalizationPolicy, Papertag, TagNormalizer};
use tempfile::tempdir;

const SAMPLE_INPUTS: [&str; 12] = [
    "CVA",
    "  cva  ",
    "Cerebrovascular Accident",
    "stroke",
    "Gait Analysis!!",
    "gait-analysis",
    "EMG",
    "Not Applicable",
    "unknown",
    "",
    "%%%",
    "Mixed   Effects__Model",
];

fn categories() -> Vec<String> {
    DEFAULT_CATEGORIES.map(String::from).to_vec()
}

fn vocabulary() -> VocabularyDocument {
    let mut vocabulary = categories()
        .into_iter()
        .map(|category| (category, CategoryVocabulary::default()))
        .collect::<VocabularyDocument>();
    vocabulary["disease"] = CategoryVocabulary {
        canonical_tags: vec!["stroke".to_string(), "parkinsons".to_string()],
        aliases: IndexMap::from([(
            "stroke".to_string(),
            vec!["CVA".to_string(), "cerebrovascular accident".to_string()],
        )]),
    };
    vocabulary["method"] = CategoryVocabulary {
        canonical_tags: vec!["EMG".to_string()],
        aliases: IndexMap::from([("EMG".to_string(), vec!["electromyography".to_string()])]),
    };
    vocabulary
}

fn normalizer() -> TagNormalizer {
    TagNormalizer::new(&vocabulary(), NormalizationPolicy::default())
}

fn record(pairs: &[(&str, &str)]) -> Record {
    Record {
        perspectives: pairs
            .iter()
            .map(|(category, label)| ((*category).to_string(), (*label).to_string()))
            .collect::<Perspectives>(),
        ..Record::default()
    }
}

#[test]
fn normalize_is_idempotent_for_every_category() {
    let normalizer = normalizer();
    for category in categories() {
        for raw in SAMPLE_INPUTS {
            let once = normalizer.normalize(raw, &category);
            let twice = normalizer.normalize(&once, &category);
            assert_eq!(twice, once, "category {category}, input {raw:?}");
        }
    }
}

#[test]
fn canonical_labels_round_trip() {
    let normalizer = normalizer();
    for (category, entry) in &vocabulary() {
        for label in &entry.canonical_tags {
            assert_eq!(&normalizer.normalize(label, category), label);
        }
    }
}

#[test]
fn aliases_resolve_regardless_of_case_and_whitespace() {
    let normalizer = normalizer();
    for (category, entry) in &vocabulary() {
        for (canonical, aliases) in &entry.aliases {
            for alias in aliases {
                for variant in [
                    alias.clone(),
                    alias.to_uppercase(),
                    alias.to_lowercase(),
                    format!("\t {alias} \n"),
                ] {
                    assert_eq!(&normalizer.normalize(&variant, category), canonical);
                }
            }
        }
    }
}

#[test]
fn scenario_alias_cva_normalizes_to_stroke() {
    assert_eq!(normalizer().normalize("CVA", "disease"), "stroke");
}

#[test]
fn scenario_empty_record_set_has_empty_summary() {
    let summary = recompute_summary([], &categories());
    assert_eq!(summary.total_papers, 0);
    for category in categories() {
        assert_eq!(summary.distribution(&category), Some(&IndexMap::new()));
    }
}

#[test]
fn scenario_three_records_produce_expected_distribution() {
    let records = [
        record(&[("disease", "stroke")]),
        record(&[("disease", "stroke")]),
        record(&[("disease", "parkinsons")]),
    ];
    let summary = recompute_summary(&records, &categories());
    assert_eq!(summary.total_papers, 3);
    assert_eq!(
        summary.distribution("disease"),
        Some(&IndexMap::from([
            ("stroke".to_string(), 2),
            ("parkinsons".to_string(), 1)
        ]))
    );
}

#[test]
fn summary_invariant_holds_for_mixed_records() {
    let records = [
        record(&[("disease", "stroke"), ("method", "emg")]),
        record(&[("disease", "not_applicable"), ("method", "")]),
        record(&[("disease", "unknown"), ("population", "adults")]),
        record(&[("method", "emg"), ("analysis", "anova")]),
        record(&[]),
    ];
    let summary = recompute_summary(&records, &categories());
    assert_eq!(summary.total_papers, records.len());
    for category in categories() {
        let counted = summary
            .distribution(&category)
            .map(|distribution| distribution.values().sum::<usize>())
            .unwrap_or_default();
        let present = records
            .iter()
            .filter(|record| {
                record
                    .perspectives
                    .get(&category)
                    .is_some_and(|label| is_countable(label))
            })
            .count();
        assert_eq!(counted, present, "category {category}");
    }
}

#[test]
fn scenario_unmatched_label_falls_back_to_slug_and_is_novel() {
    let resolution = normalizer().resolve("Gait Analysis!!", "method");
    assert_eq!(resolution.label, "gait_analysis");
    assert_eq!(resolution.kind, ResolutionKind::Novel);
}

#[test]
fn scenario_cooccurrence_threshold() {
    let mut records = (0..4)
        .map(|_| record(&[("disease", "stroke"), ("method", "gait_analysis")]))
        .collect::<Vec<_>>();
    records.push(record(&[("disease", "parkinsons"), ("method", "emg")]));
    let advisor = CooccurrenceAdvisor::new(categories(), "study_type");

    let at_three = advisor.suggest(&records, 3);
    assert!(at_three.iter().any(|suggestion| {
        suggestion.tags == ["stroke", "gait_analysis"] && suggestion.count == 4
    }));
    assert!(advisor.suggest(&records, 5).is_empty());

    let mut previous = usize::MAX;
    for threshold in 0..=6 {
        let emitted = advisor.suggest(&records, threshold);
        assert!(emitted.iter().all(|suggestion| suggestion.count >= threshold));
        assert!(emitted.len() <= previous);
        previous = emitted.len();
    }
}

#[test]
fn end_to_end_catalog_keeps_summary_in_step_with_records() {
    let temp = tempdir().expect("tempdir");
    let app = Papertag::open(temp.path()).expect("open");
    app.initialize().expect("initialize");
    app.add_canonical_label(
        "disease",
        "stroke",
        &["CVA".to_string(), "cerebrovascular accident".to_string()],
    )
    .expect("add stroke");

    for disease in ["CVA", "stroke", "Parkinsons", "cerebrovascular accident"] {
        app.add_record(
            RecordDraft::default()
                .with_perspective("disease", disease)
                .with_perspective("population", "Not Applicable"),
        )
        .expect("add record");
    }

    let summary = app.summary().expect("summary");
    assert_eq!(summary.total_papers, 4);
    assert_eq!(
        summary.distribution("disease"),
        Some(&IndexMap::from([
            ("stroke".to_string(), 3),
            ("parkinsons".to_string(), 1)
        ]))
    );
    assert_eq!(summary.distribution("population"), Some(&IndexMap::new()));
    assert!(app.verify_summary().expect("verify").consistent);
    let ids = app.records().expect("records").keys().cloned().collect::<Vec<_>>();
    assert_eq!(ids, vec!["paper001", "paper002", "paper003", "paper004"]);
}
