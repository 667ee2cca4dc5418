//! Adding, deleting, and clearing hunts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::containment::ContainmentIndex;
use crate::error::{EngineError, ErrorCode};
use crate::model::hunt::normalize_status;
use crate::model::{Hunt, HuntStats};
use crate::reconcile::{ReconcileReport, reconcile, repair_origins};
use crate::state::AggregateState;
use crate::stats::compute_hunt_stats;
use crate::upstream::HuntSource;

/// Result of [`add_hunt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddReport {
    pub hunt_id: String,
    pub name: String,
    /// Stats computed at import time, before the follow-up reconciliation.
    pub stats: HuntStats,
    /// Samples already labeled by another hunt.
    pub pre_labeled: usize,
    pub reconcile: ReconcileReport,
}

/// Result of [`delete_hunt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub hunt_id: String,
    pub name: String,
    /// Size of the deleted hunt's sample set.
    pub samples: usize,
    /// Labels moved to a remaining hunt.
    pub reassigned: usize,
    /// Labels dropped because no remaining hunt contains the sample.
    pub removed: usize,
    pub remaining_hunts: usize,
}

/// Result of [`clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub hunts: usize,
    pub labels: usize,
}

/// Import a completed upstream hunt into the registry.
///
/// Samples already labeled elsewhere are counted as pre-labeled. After the
/// hunt is appended a full reconciliation pass runs; per-hunt failures in
/// that pass are logged and returned in the report, never as an error.
///
/// # Errors
///
/// - [`EngineError::Validation`] for a blank id or name, a duplicate id,
///   or an upstream status other than completed.
/// - [`EngineError::Upstream`] if the samples or details cannot be fetched.
pub fn add_hunt(
    state: &mut AggregateState,
    source: &dyn HuntSource,
    hunt_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<AddReport, EngineError> {
    let hunt_id = hunt_id.trim();
    let name = name.trim();
    if hunt_id.is_empty() {
        return Err(EngineError::missing("hunt_id"));
    }
    if name.is_empty() {
        return Err(EngineError::missing("name"));
    }
    if let Some(existing) = state.hunts.get(hunt_id) {
        warn!(hunt = hunt_id, existing = existing.name.as_str(), "hunt already added");
        return Err(EngineError::validation(
            ErrorCode::DuplicateHunt,
            format!(
                "hunt '{hunt_id}' has already been added as \"{}\"",
                existing.name
            ),
        ));
    }

    info!(hunt = hunt_id, hunt_name = name, "adding hunt");
    let samples = source.fetch_hunt_results(hunt_id)?;
    let details = source.fetch_hunt_details(hunt_id)?;

    let status = normalize_status(&details.status);
    info!(hunt = hunt_id, status = status.as_str(), samples = samples.len(), "fetched hunt");
    if !details.is_completed() {
        warn!(hunt = hunt_id, status = status.as_str(), "refusing non-completed hunt");
        return Err(EngineError::validation(
            ErrorCode::HuntNotCompleted,
            format!(
                "hunt '{hunt_id}' has status \"{status}\" and is not ready for analysis; \
                 only COMPLETED hunts can be imported"
            ),
        ));
    }

    let stats = compute_hunt_stats(hunt_id, &samples, &state.labels);
    info!(
        hunt = hunt_id,
        tp = stats.true_positives,
        fp = stats.false_positives,
        pre_labeled = stats.pre_labeled,
        "auto-labeled from existing labels"
    );

    let mut hunt = Hunt::new(hunt_id, name, now);
    hunt.stats = stats;
    hunt.timeframe = details.timeframe();
    hunt.rule_source = details.rule_source().map(str::to_string);
    hunt.upstream_status = Some(status);
    state.hunts.push(hunt);

    let report = reconcile(state, source);
    for failed in report.failed_hunts() {
        error!(hunt = failed.hunt_id.as_str(), "reconciliation after add could not refresh hunt");
    }

    Ok(AddReport {
        hunt_id: hunt_id.to_string(),
        name: name.to_string(),
        stats,
        pre_labeled: stats.pre_labeled,
        reconcile: report,
    })
}

/// Remove a hunt and repair the labels it owned.
///
/// Labels owned by the deleted hunt move to the first remaining hunt (in
/// registry order) that contains the sample, keeping their classification;
/// labels for samples no remaining hunt contains are dropped. Other labels
/// and other hunts' cached stats are not touched.
///
/// All sample sets are fetched before anything is changed, so an upstream
/// failure leaves `state` as it was.
///
/// # Errors
///
/// - [`EngineError::Validation`] for a blank id.
/// - [`EngineError::NotFound`] if the hunt is not registered.
/// - [`EngineError::Upstream`] if any sample set cannot be fetched.
pub fn delete_hunt(
    state: &mut AggregateState,
    source: &dyn HuntSource,
    hunt_id: &str,
) -> Result<DeleteReport, EngineError> {
    let hunt_id = hunt_id.trim();
    if hunt_id.is_empty() {
        return Err(EngineError::missing("hunt_id"));
    }
    if !state.hunts.contains(hunt_id) {
        return Err(EngineError::hunt_not_found(hunt_id));
    }

    let deleted_samples = source.fetch_hunt_results(hunt_id)?;
    let mut index = ContainmentIndex::new();
    let remaining: Vec<String> = state
        .hunts
        .ids()
        .into_iter()
        .filter(|id| id != hunt_id)
        .collect();
    for id in &remaining {
        let samples = source.fetch_hunt_results(id)?;
        debug!(hunt = id.as_str(), samples = samples.len(), "indexed remaining hunt");
        index.add_hunt(id, &samples);
    }

    let Some(hunt) = state.hunts.remove(hunt_id) else {
        return Err(EngineError::hunt_not_found(hunt_id));
    };
    info!(hunt = hunt_id, name = hunt.name.as_str(), "deleted hunt");

    let repair = repair_origins(
        state,
        &index,
        |origin| origin == hunt_id,
        remaining.len(),
        true,
    );
    info!(
        hunt = hunt_id,
        reassigned = repair.reassigned,
        removed = repair.removed,
        "repaired labels of deleted hunt"
    );

    Ok(DeleteReport {
        hunt_id: hunt_id.to_string(),
        name: hunt.name,
        samples: deleted_samples.len(),
        reassigned: repair.reassigned,
        removed: repair.removed,
        remaining_hunts: remaining.len(),
    })
}

/// Reset to the empty aggregate.
pub fn clear(state: &mut AggregateState) -> ClearReport {
    let report = ClearReport {
        hunts: state.hunts.len(),
        labels: state.labels.len(),
    };
    state.clear();
    info!(hunts = report.hunts, labels = report.labels, "cleared all data");
    report
}
