//! Analyst labeling actions on top of the label store.
//!
//! Only the by-origin TP/FP counts of the affected hunts are refreshed here.
//! Pre-labeled and unlabeled counts wait for the next view or reconciliation.

use serde::Serialize;
use tracing::info;

use crate::error::EngineError;
use crate::labels::BulkOutcome;
use crate::model::{Classification, LabelRecord};
use crate::state::AggregateState;
use crate::upstream::HuntSource;

/// Result of [`categorize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorizeOutcome {
    pub record: LabelRecord,
    /// The label this one replaced, if any.
    pub previous: Option<LabelRecord>,
}

fn refresh_origin_counts(state: &mut AggregateState, hunt_id: &str) {
    let tp = state
        .labels
        .count_by_origin(hunt_id, Classification::TruePositive);
    let fp = state
        .labels
        .count_by_origin(hunt_id, Classification::FalsePositive);
    if let Some(hunt) = state.hunts.get_mut(hunt_id) {
        hunt.stats.true_positives = tp;
        hunt.stats.false_positives = fp;
    }
}

/// Label one sample on behalf of `hunt_id`.
///
/// # Errors
///
/// - [`EngineError::Validation`] if any argument is blank.
/// - [`EngineError::NotFound`] if `hunt_id` is not registered.
pub fn categorize(
    state: &mut AggregateState,
    sample_id: &str,
    hunt_id: &str,
    subject: &str,
    classification: Classification,
) -> Result<CategorizeOutcome, EngineError> {
    for (name, value) in [("sample_id", sample_id), ("hunt_id", hunt_id), ("subject", subject)] {
        if value.trim().is_empty() {
            return Err(EngineError::missing(name));
        }
    }
    if !state.hunts.contains(hunt_id) {
        return Err(EngineError::hunt_not_found(hunt_id));
    }

    let previous = state.labels.lookup(sample_id).cloned();
    let record = state
        .labels
        .classify(sample_id, hunt_id, subject, classification);
    info!(
        sample = sample_id,
        hunt = hunt_id,
        classification = %classification,
        "categorized sample"
    );

    refresh_origin_counts(state, hunt_id);
    if let Some(prev) = &previous {
        if prev.origin_hunt_id != hunt_id {
            refresh_origin_counts(state, &prev.origin_hunt_id);
        }
    }

    Ok(CategorizeOutcome { record, previous })
}

/// Label many samples of one hunt at once.
///
/// Subjects come from a fresh fetch of the hunt's samples. Ids not in that
/// sample set are reported as failed without blocking the rest.
///
/// # Errors
///
/// - [`EngineError::Validation`] for a blank hunt id or an empty id list.
/// - [`EngineError::NotFound`] if `hunt_id` is not registered.
/// - [`EngineError::Upstream`] if the hunt's samples cannot be fetched.
pub fn mass_categorize(
    state: &mut AggregateState,
    source: &dyn HuntSource,
    hunt_id: &str,
    sample_ids: &[String],
    classification: Classification,
) -> Result<BulkOutcome, EngineError> {
    if hunt_id.trim().is_empty() {
        return Err(EngineError::missing("hunt_id"));
    }
    if sample_ids.is_empty() {
        return Err(EngineError::missing("sample_ids"));
    }
    if !state.hunts.contains(hunt_id) {
        return Err(EngineError::hunt_not_found(hunt_id));
    }

    let samples = source.fetch_hunt_results(hunt_id)?;
    let previous_owners: Vec<String> = sample_ids
        .iter()
        .filter_map(|id| state.labels.lookup(id.trim()))
        .map(|r| r.origin_hunt_id.clone())
        .filter(|origin| origin != hunt_id)
        .collect();

    let outcome = state
        .labels
        .bulk_classify(hunt_id, sample_ids, classification, &samples);
    info!(
        hunt = hunt_id,
        classification = %classification,
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "mass categorized samples"
    );

    refresh_origin_counts(state, hunt_id);
    for origin in previous_owners {
        refresh_origin_counts(state, &origin);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::model::{Hunt, Sample};
    use crate::upstream::MemorySource;
    use chrono::Utc;

    fn state() -> AggregateState {
        let mut state = AggregateState::new();
        state.hunts.push(Hunt::new("a", "a", Utc::now()));
        state.hunts.push(Hunt::new("b", "b", Utc::now()));
        state
    }

    #[test]
    fn categorize_validates_input() {
        let mut state = state();
        let err = categorize(&mut state, "", "a", "s", Classification::TruePositive).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingParameter);
        let err = categorize(&mut state, "m1", "zz", "s", Classification::TruePositive).unwrap_err();
        assert_eq!(err.code(), ErrorCode::HuntNotFound);
        assert!(state.labels.is_empty());
    }

    #[test]
    fn categorize_refreshes_previous_owner() {
        let mut state = state();
        categorize(&mut state, "m1", "a", "s", Classification::TruePositive).unwrap();
        assert_eq!(state.hunts.get("a").unwrap().stats.true_positives, 1);

        let outcome =
            categorize(&mut state, "m1", "b", "s", Classification::FalsePositive).unwrap();
        assert_eq!(outcome.previous.unwrap().origin_hunt_id, "a");
        assert_eq!(state.hunts.get("a").unwrap().stats.true_positives, 0);
        assert_eq!(state.hunts.get("b").unwrap().stats.false_positives, 1);
    }

    #[test]
    fn mass_categorize_reports_partial_failures() {
        let mut source = MemorySource::new();
        source.insert_completed("a", vec![Sample::new("m1", "one"), Sample::new("m2", "two")]);
        let mut state = state();

        let ids = vec!["m1".to_string(), "m3".to_string()];
        let outcome =
            mass_categorize(&mut state, &source, "a", &ids, Classification::FalsePositive).unwrap();
        assert_eq!(outcome.succeeded, vec!["m1"]);
        assert_eq!(outcome.failed[0].sample_id, "m3");
        assert_eq!(state.hunts.get("a").unwrap().stats.false_positives, 1);

        let err = mass_categorize(&mut state, &source, "a", &[], Classification::TruePositive)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingParameter);
    }
}
