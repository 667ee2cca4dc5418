use chrono::{TimeZone, Utc};
use huntdiff_core::AggregateState;
use huntdiff_core::labeling::categorize;
use huntdiff_core::lifecycle::add_hunt;
use huntdiff_core::model::{Classification, Hunt, HuntStats, Sample};
use huntdiff_core::reconcile::reconcile;
use huntdiff_core::upstream::MemorySource;
use proptest::prelude::*;

fn samples(ids: &[&str]) -> Vec<Sample> {
    ids.iter()
        .map(|id| Sample::new(*id, format!("subject {id}")))
        .collect()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

#[test]
fn overlapping_hunts_share_labels() {
    let mut source = MemorySource::new();
    source.insert_completed("A", samples(&["m1", "m2", "m3"]));
    source.insert_completed("B", samples(&["m1", "m3"]));
    let mut state = AggregateState::new();

    add_hunt(&mut state, &source, "A", "baseline", now()).unwrap();
    categorize(&mut state, "m1", "A", "subject m1", Classification::TruePositive).unwrap();
    categorize(&mut state, "m2", "A", "subject m2", Classification::FalsePositive).unwrap();

    let report = add_hunt(&mut state, &source, "B", "tightened", now()).unwrap();
    assert_eq!(report.pre_labeled, 1);

    let b = state.hunts.get("B").unwrap();
    assert_eq!(
        b.stats,
        HuntStats {
            true_positives: 1,
            false_positives: 0,
            pre_labeled: 1,
            total_new_samples: 1,
            labeled_new_samples: 0,
            unlabeled: 1,
            total_samples: 2,
        }
    );

    categorize(&mut state, "m3", "B", "subject m3", Classification::TruePositive).unwrap();
    reconcile(&mut state, &source);

    let b = state.hunts.get("B").unwrap();
    assert_eq!(b.stats.true_positives, 2);
    assert_eq!(b.stats.pre_labeled, 1);
    assert_eq!(b.stats.total_new_samples, 1);
    assert_eq!(b.stats.labeled_new_samples, 1);
    assert_eq!(b.stats.unlabeled, 0);

    // A sees m3 as pre-labeled now that B owns it.
    let a = state.hunts.get("A").unwrap();
    assert_eq!(a.stats.pre_labeled, 1);
    assert_eq!(a.stats.true_positives, 2);
    assert_eq!(a.stats.false_positives, 1);
    assert_eq!(a.stats.unlabeled, 0);
}

#[test]
fn reconcile_twice_is_a_noop() {
    let mut source = MemorySource::new();
    source.insert_completed("A", samples(&["m1", "m2"]));
    source.insert_completed("B", samples(&["m2", "m3"]));

    let mut state = AggregateState::new();
    state.hunts.push(Hunt::new("A", "a", now()));
    state.hunts.push(Hunt::new("B", "b", now()));
    state
        .labels
        .classify("m2", "deleted", "s", Classification::TruePositive);
    state
        .labels
        .classify("m9", "deleted", "s", Classification::FalsePositive);
    state
        .labels
        .classify("m3", "B", "s", Classification::FalsePositive);

    let first = reconcile(&mut state, &source);
    assert_eq!(first.reassigned, 1);
    assert_eq!(first.removed, 1);
    assert_eq!(state.labels.lookup("m2").unwrap().origin_hunt_id, "A");
    assert_eq!(state.dangling_label_count(), 0);

    let snapshot = state.clone();
    let second = reconcile(&mut state, &source);
    assert_eq!(state, snapshot);
    assert_eq!(second.reassigned, 0);
    assert_eq!(second.removed, 0);
    assert!(second.outcomes.iter().all(|o| !o.stats_changed()));
}

fn scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<(u8, u8, bool)>)> {
    (
        prop::collection::vec(prop::collection::vec(0_u8..8, 0..6), 1..4),
        prop::collection::vec((0_u8..10, 0_u8..5, any::<bool>()), 0..12),
    )
}

proptest! {
    #[test]
    fn reconciliation_is_idempotent((hunts, labels) in scenario()) {
        let mut source = MemorySource::new();
        let mut state = AggregateState::new();
        for (i, members) in hunts.iter().enumerate() {
            let id = format!("h{i}");
            let set: Vec<Sample> = members
                .iter()
                .map(|m| Sample::new(format!("m{m}"), "s"))
                .collect();
            source.insert_completed(&id, set);
            state.hunts.push(Hunt::new(id.clone(), id, now()));
        }
        // Origins h0..h4 may or may not be registered.
        for (sample, origin, tp) in labels {
            let classification = if tp {
                Classification::TruePositive
            } else {
                Classification::FalsePositive
            };
            state
                .labels
                .classify(&format!("m{sample}"), &format!("h{origin}"), "s", classification);
        }

        reconcile(&mut state, &source);
        prop_assert_eq!(state.dangling_label_count(), 0);
        let once = state.clone();
        reconcile(&mut state, &source);
        prop_assert_eq!(state, once);
    }
}
