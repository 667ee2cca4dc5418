//! Global label store shared by every hunt.
//!
//! One record per sample id, last write wins. A sample is therefore always
//! exactly one of unlabeled, true positive, or false positive, no matter how
//! many hunts it appears in. Ownership of a label is logical only: the
//! record's `origin_hunt_id` names a hunt, but no hunt holds labels of its own.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{Classification, LabelRecord, Sample};

/// Mapping from sample id to its current label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelStore {
    records: BTreeMap<String, LabelRecord>,
}

/// One id that `bulk_classify` could not label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub sample_id: String,
    pub reason: String,
}

/// Per-id result of a bulk classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl LabelStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Label `sample_id` as `classification`, owned by `hunt_id`.
    ///
    /// Any previous record for the sample is dropped first, whichever hunt
    /// owned it and whichever way it was classified.
    pub fn classify(
        &mut self,
        sample_id: &str,
        hunt_id: &str,
        subject: &str,
        classification: Classification,
    ) -> LabelRecord {
        if let Some(previous) = self.records.remove(sample_id) {
            if previous.classification == classification.opposite() {
                info!(
                    sample = sample_id,
                    from = %previous.classification,
                    to = %classification,
                    "reclassifying sample"
                );
            } else {
                debug!(
                    sample = sample_id,
                    previous_origin = previous.origin_hunt_id.as_str(),
                    "overwriting existing label"
                );
            }
        }

        let record = LabelRecord {
            sample_id: sample_id.to_string(),
            classification,
            origin_hunt_id: hunt_id.to_string(),
            cached_subject: subject.to_string(),
        };
        self.records.insert(sample_id.to_string(), record.clone());
        record
    }

    /// Classify every id in `sample_ids`, resolving subjects from `samples`.
    ///
    /// Each id stands alone: an empty id or one that is not part of
    /// `samples` is reported as failed and the rest are still applied.
    pub fn bulk_classify(
        &mut self,
        hunt_id: &str,
        sample_ids: &[String],
        classification: Classification,
        samples: &[Sample],
    ) -> BulkOutcome {
        let subjects: HashMap<&str, &str> = samples
            .iter()
            .map(|s| (s.id.as_str(), s.subject.as_str()))
            .collect();

        let mut outcome = BulkOutcome::default();
        for raw in sample_ids {
            let sample_id = raw.trim();
            if sample_id.is_empty() {
                outcome.failed.push(BulkFailure {
                    sample_id: raw.clone(),
                    reason: "empty sample id".to_string(),
                });
                continue;
            }

            match subjects.get(sample_id) {
                Some(subject) => {
                    self.classify(sample_id, hunt_id, subject, classification);
                    outcome.succeeded.push(sample_id.to_string());
                }
                None => outcome.failed.push(BulkFailure {
                    sample_id: sample_id.to_string(),
                    reason: format!("sample not found in hunt {hunt_id}"),
                }),
            }
        }

        outcome
    }

    #[must_use]
    pub fn lookup(&self, sample_id: &str) -> Option<&LabelRecord> {
        self.records.get(sample_id)
    }

    /// Classification of `sample_id`, if labeled.
    #[must_use]
    pub fn classification_of(&self, sample_id: &str) -> Option<Classification> {
        self.lookup(sample_id).map(|r| r.classification)
    }

    /// Number of labels of `classification` owned by `hunt_id`.
    #[must_use]
    pub fn count_by_origin(&self, hunt_id: &str, classification: Classification) -> usize {
        self.records
            .values()
            .filter(|r| r.origin_hunt_id == hunt_id && r.classification == classification)
            .count()
    }

    /// Move ownership of an existing label to `hunt_id`.
    ///
    /// Returns `false` when the sample is not labeled.
    pub fn reassign_origin(&mut self, sample_id: &str, hunt_id: &str) -> bool {
        match self.records.get_mut(sample_id) {
            Some(record) => {
                record.origin_hunt_id = hunt_id.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, sample_id: &str) -> Option<LabelRecord> {
        self.records.remove(sample_id)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Labels of `classification`, in sample-id order.
    pub fn with_classification(
        &self,
        classification: Classification,
    ) -> impl Iterator<Item = &LabelRecord> {
        self.records
            .values()
            .filter(move |r| r.classification == classification)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelRecord> {
        self.records.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classify_overwrites_opposite_label() {
        let mut store = LabelStore::new();
        store.classify("m1", "h1", "Invoice", Classification::TruePositive);
        let record = store.classify("m1", "h2", "Invoice", Classification::FalsePositive);

        assert_eq!(record.origin_hunt_id, "h2");
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.classification_of("m1"),
            Some(Classification::FalsePositive)
        );
        assert_eq!(store.count_by_origin("h1", Classification::TruePositive), 0);
        assert_eq!(store.count_by_origin("h2", Classification::FalsePositive), 1);
    }

    #[test]
    fn classify_twice_is_idempotent() {
        let mut once = LabelStore::new();
        once.classify("m1", "h1", "Hello", Classification::TruePositive);

        let mut twice = once.clone();
        twice.classify("m1", "h1", "Hello", Classification::TruePositive);

        assert_eq!(once, twice);
    }

    #[test]
    fn bulk_classify_reports_failures_independently() {
        let mut store = LabelStore::new();
        let samples = vec![Sample::new("m1", "First"), Sample::new("m2", "Second")];
        let ids = vec![
            "m1".to_string(),
            "missing".to_string(),
            " ".to_string(),
            "m2".to_string(),
        ];

        let outcome = store.bulk_classify("h1", &ids, Classification::FalsePositive, &samples);

        assert_eq!(outcome.succeeded, vec!["m1".to_string(), "m2".to_string()]);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].sample_id, "missing");
        assert_eq!(outcome.failed[1].reason, "empty sample id");
        assert_eq!(store.lookup("m2").unwrap().cached_subject, "Second");
        assert!(store.lookup("missing").is_none());
    }

    #[test]
    fn reassign_and_remove() {
        let mut store = LabelStore::new();
        store.classify("m1", "h1", "s", Classification::TruePositive);
        store.classify("m2", "h1", "s", Classification::FalsePositive);
        store.classify("m3", "h2", "s", Classification::TruePositive);

        assert_eq!(store.count_by_origin("h1", Classification::FalsePositive), 1);
        assert!(store.reassign_origin("m1", "h2"));
        assert!(!store.reassign_origin("nope", "h2"));
        assert_eq!(store.count_by_origin("h2", Classification::TruePositive), 2);

        assert!(store.remove("m2").is_some());
        assert_eq!(store.len(), 2);
        assert_eq!(
            store
                .with_classification(Classification::TruePositive)
                .count(),
            2
        );
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut store = LabelStore::new();
        store.classify("m1", "h1", "s", Classification::TruePositive);
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["m1"]["origin_hunt_id"], "h1");
        assert_eq!(json["m1"]["classification"], "true_positive");
    }

    fn classification_strategy() -> impl Strategy<Value = Classification> {
        prop_oneof![
            Just(Classification::TruePositive),
            Just(Classification::FalsePositive)
        ]
    }

    proptest! {
        #[test]
        fn last_write_wins_per_sample(
            ops in prop::collection::vec(
                (0_u8..6, 0_u8..3, classification_strategy()),
                1..64,
            )
        ) {
            let mut store = LabelStore::new();
            let mut expected: BTreeMap<String, (String, Classification)> = BTreeMap::new();

            for (sample, hunt, classification) in ops {
                let sample_id = format!("m{sample}");
                let hunt_id = format!("h{hunt}");
                store.classify(&sample_id, &hunt_id, "subject", classification);
                expected.insert(sample_id, (hunt_id, classification));
            }

            prop_assert_eq!(store.len(), expected.len());
            for (sample_id, (hunt_id, classification)) in &expected {
                let record = store.lookup(sample_id).unwrap();
                prop_assert_eq!(&record.origin_hunt_id, hunt_id);
                prop_assert_eq!(record.classification, *classification);
            }

            let tp = store.with_classification(Classification::TruePositive).count();
            let fp = store.with_classification(Classification::FalsePositive).count();
            prop_assert_eq!(tp + fp, store.len());
        }
    }
}
