use chrono::Utc;
use huntdiff_core::compare::{VerdictKind, compare_hunts};
use huntdiff_core::diff::{DiffOp, NO_SOURCE_MARKER};
use huntdiff_core::labeling::categorize;
use huntdiff_core::lifecycle::add_hunt;
use huntdiff_core::model::{Classification, Sample};
use huntdiff_core::reconcile::reconcile;
use huntdiff_core::upstream::MemorySource;
use huntdiff_core::{AggregateState, ErrorCode};

fn samples(ids: &[&str]) -> Vec<Sample> {
    ids.iter()
        .map(|id| Sample::new(*id, format!("subject {id}")))
        .collect()
}

fn label(state: &mut AggregateState, hunt: &str, sample: &str, c: Classification) {
    categorize(state, sample, hunt, &format!("subject {sample}"), c).unwrap();
}

fn setup(prev: &[&str], curr: &[&str]) -> (AggregateState, MemorySource) {
    let mut source = MemorySource::new();
    source.insert_completed("P", samples(prev));
    source.insert_completed("C", samples(curr));
    source.details_mut("P").unwrap().source = Some("sender.domain == 'abc'".to_string());
    source.details_mut("C").unwrap().source = Some("sender.domain == 'abd'".to_string());

    let mut state = AggregateState::new();
    add_hunt(&mut state, &source, "P", "previous", Utc::now()).unwrap();
    add_hunt(&mut state, &source, "C", "current", Utc::now()).unwrap();
    (state, source)
}

#[test]
fn refuses_incompletely_labeled_hunts() {
    let (mut state, source) = setup(&["m1"], &["m1", "m2", "m3"]);
    label(&mut state, "P", "m1", Classification::TruePositive);
    reconcile(&mut state, &source);

    // m1 counts once as a TP and once more as pre-labeled: min(3, 1 + 1).
    let err = compare_hunts(&state, &source, "P", "C").unwrap_err();
    assert_eq!(err.code(), ErrorCode::IncompleteLabels);
    let message = err.to_string();
    assert!(message.contains("\"current\""), "{message}");
    assert!(message.contains("2/3"), "{message}");
}

#[test]
fn pre_labeled_samples_are_credited_toward_completeness() {
    let (mut state, source) = setup(&["m1"], &["m1", "m2"]);
    label(&mut state, "P", "m1", Classification::TruePositive);
    reconcile(&mut state, &source);

    let current = state.hunts.get("C").unwrap();
    assert_eq!(current.stats.pre_labeled, 1);
    assert_eq!(current.stats.credited_labeled(), 2);

    let cmp = compare_hunts(&state, &source, "P", "C").unwrap();
    assert_eq!(cmp.common_true_positives.len(), 1);
    assert!(cmp.new_true_positives.is_empty());
    assert_eq!(cmp.verdict.kind, VerdictKind::Warning);
}

#[test]
fn refuses_same_or_unknown_hunts() {
    let (state, source) = setup(&["m1"], &["m1"]);
    let err = compare_hunts(&state, &source, "P", "P").unwrap_err();
    assert_eq!(err.code(), ErrorCode::SameHunt);
    let err = compare_hunts(&state, &source, "P", "X").unwrap_err();
    assert_eq!(err.code(), ErrorCode::HuntNotFound);
}

#[test]
fn zero_previous_false_positives() {
    let (mut state, source) = setup(&["m1"], &["m1", "m4"]);
    label(&mut state, "P", "m1", Classification::TruePositive);
    label(&mut state, "C", "m4", Classification::TruePositive);
    reconcile(&mut state, &source);

    let cmp = compare_hunts(&state, &source, "P", "C").unwrap();
    assert_eq!(cmp.prev_false_positives, 0);
    assert_eq!(cmp.metrics.fp_reduction_count, 0);
    assert!(cmp.metrics.fp_reduction_percent.abs() < f64::EPSILON);
    assert!((cmp.metrics.tp_retention_percent - 100.0).abs() < f64::EPSILON);
    assert_eq!(cmp.metrics.new_tp_count, 1);
    assert!(cmp.missing_all_true_positives.is_empty());

    assert_eq!(cmp.verdict.kind, VerdictKind::Success);
    assert_eq!(
        cmp.verdict.message,
        "Mixed results: Current rule maintains all true positives but did not reduce false \
         positives. However, it found 1 new true positives, which is positive."
    );
}

#[test]
fn eliminated_false_positives_and_missing_true_positives() {
    let (mut state, source) = setup(&["m1", "m2", "m3", "m4"], &["m1", "m3"]);
    label(&mut state, "P", "m1", Classification::TruePositive);
    label(&mut state, "P", "m2", Classification::TruePositive);
    label(&mut state, "P", "m3", Classification::FalsePositive);
    label(&mut state, "P", "m4", Classification::FalsePositive);
    reconcile(&mut state, &source);

    let cmp = compare_hunts(&state, &source, "P", "C").unwrap();
    assert_eq!(cmp.common_true_positives.len(), 1);
    assert_eq!(cmp.missing_true_positives[0].id, "m2");
    assert_eq!(cmp.common_false_positives[0].id, "m3");
    assert_eq!(cmp.eliminated_false_positives[0].id, "m4");
    assert_eq!(cmp.missing_all_true_positives.len(), 1);
    assert_eq!(cmp.missing_all_true_positives[0].hunt_name, "previous");
    assert!((cmp.metrics.fp_reduction_percent - 50.0).abs() < f64::EPSILON);

    assert_eq!(cmp.verdict.kind, VerdictKind::Warning);
    assert_eq!(
        cmp.verdict.message,
        "Mixed results: Current rule reduces false positives by 50.0% but misses 1 true positives."
    );
}

#[test]
fn rule_source_diff_is_attached() {
    let (mut state, source) = setup(&["m1"], &["m1"]);
    label(&mut state, "P", "m1", Classification::FalsePositive);
    reconcile(&mut state, &source);

    let cmp = compare_hunts(&state, &source, "P", "C").unwrap();
    let ops: Vec<DiffOp> = cmp.rule_diff.iter().map(|s| s.op).collect();
    assert_eq!(ops, vec![DiffOp::Equal, DiffOp::Delete, DiffOp::Insert, DiffOp::Equal]);
    assert!(cmp.rule_diff_html.starts_with("<pre><span>sender.domain == 'ab</span>"));
    assert_ne!(cmp.rule_diff_html, NO_SOURCE_MARKER);
    assert!(cmp.timeframe_warning.is_none());
}
