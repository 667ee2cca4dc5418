//! Full reconciliation pass over every registered hunt.
//!
//! One pass fetches each hunt's sample set exactly once, repairs labels whose
//! origin hunt is no longer registered, recomputes every hunt's cached
//! counts, and backfills missing timeframe/source metadata. Failures are
//! collected per hunt; the pass itself never fails.
//!
//! Dangling origins are repaired before counts are recomputed, so a second
//! pass over unchanged inputs produces the same state.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::containment::ContainmentIndex;
use crate::model::hunt::normalize_status;
use crate::model::{Hunt, HuntStats, Sample};
use crate::state::AggregateState;
use crate::stats::compute_hunt_stats;
use crate::upstream::{HuntDetails, HuntSource};

/// Result of fetching one hunt's sample set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Ok { samples: usize },
    Failed { error: String },
}

/// What happened to a hunt's timeframe/source metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetadataOutcome {
    /// Timeframe and source were already cached.
    Present,
    Backfilled,
    /// Upstream no longer reports the hunt as completed.
    StatusWarning { upstream_status: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HuntOutcome {
    pub hunt_id: String,
    pub name: String,
    pub fetch: FetchOutcome,
    pub metadata: MetadataOutcome,
    pub before: HuntStats,
    pub after: HuntStats,
}

impl HuntOutcome {
    #[must_use]
    pub fn stats_changed(&self) -> bool {
        self.before != self.after
    }
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub hunts: usize,
    pub outcomes: Vec<HuntOutcome>,
    /// Dangling labels moved to a registered hunt.
    pub reassigned: usize,
    /// Dangling labels whose sample no longer appears in any hunt.
    pub removed: usize,
    /// Dangling labels left alone because a sample-set fetch failed.
    pub deferred: usize,
}

impl ReconcileReport {
    /// Hunts whose sample set could not be fetched.
    pub fn failed_hunts(&self) -> impl Iterator<Item = &HuntOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.fetch, FetchOutcome::Failed { .. }))
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_hunts().next().is_none()
    }
}

/// Where dangling labels go after the index is built.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RepairCounts {
    pub reassigned: usize,
    pub removed: usize,
    pub deferred: usize,
}

/// Re-point or drop every label whose origin is not in `registry_ids`.
///
/// `trusted_prefix` is the number of leading registry hunts whose sample
/// sets are known. A reassignment target beyond that prefix might not be
/// the true first containing hunt, and a missing entry might just be an
/// unfetched hunt, so both cases are deferred.
pub(crate) fn repair_origins(
    state: &mut AggregateState,
    index: &ContainmentIndex,
    mut is_dangling: impl FnMut(&str) -> bool,
    trusted_prefix: usize,
    complete: bool,
) -> RepairCounts {
    let mut counts = RepairCounts::default();
    let dangling: Vec<(String, String)> = state
        .labels
        .iter()
        .filter(|r| is_dangling(&r.origin_hunt_id))
        .map(|r| (r.sample_id.clone(), r.origin_hunt_id.clone()))
        .collect();

    for (sample_id, old_origin) in dangling {
        let target = index.first_containing(&sample_id).map(str::to_string);
        match target {
            Some(hunt_id)
                if state
                    .hunts
                    .position(&hunt_id)
                    .is_some_and(|pos| pos < trusted_prefix) =>
            {
                info!(
                    sample = sample_id.as_str(),
                    from = old_origin.as_str(),
                    to = hunt_id.as_str(),
                    "reassigning label from unregistered hunt"
                );
                state.labels.reassign_origin(&sample_id, &hunt_id);
                counts.reassigned += 1;
            }
            None if complete => {
                info!(
                    sample = sample_id.as_str(),
                    origin = old_origin.as_str(),
                    "removing label for sample not in any hunt"
                );
                state.labels.remove(&sample_id);
                counts.removed += 1;
            }
            _ => {
                debug!(sample = sample_id.as_str(), "deferring label repair");
                counts.deferred += 1;
            }
        }
    }

    counts
}

/// Run a full reconciliation pass over `state`.
///
/// The caller persists the result.
pub fn reconcile(state: &mut AggregateState, source: &dyn HuntSource) -> ReconcileReport {
    let hunt_ids = state.hunts.ids();
    if hunt_ids.is_empty() {
        info!("no hunts to reconcile");
        return ReconcileReport::default();
    }
    info!(hunts = hunt_ids.len(), labels = state.labels.len(), "reconciling");

    let mut index = ContainmentIndex::new();
    let mut sample_sets: HashMap<String, Vec<Sample>> = HashMap::new();
    let mut fetch_errors: HashMap<String, String> = HashMap::new();
    let mut first_failed: Option<usize> = None;

    for (pos, hunt_id) in hunt_ids.iter().enumerate() {
        match source.fetch_hunt_results(hunt_id) {
            Ok(samples) => {
                debug!(hunt = hunt_id.as_str(), samples = samples.len(), "fetched samples");
                index.add_hunt(hunt_id, &samples);
                sample_sets.insert(hunt_id.clone(), samples);
            }
            Err(err) => {
                warn!(hunt = hunt_id.as_str(), error = %err, "sample fetch failed, keeping cached stats");
                first_failed.get_or_insert(pos);
                fetch_errors.insert(hunt_id.clone(), err.to_string());
            }
        }
    }

    let repair = repair_origins(
        state,
        &index,
        |origin| !hunt_ids.iter().any(|id| id == origin),
        first_failed.unwrap_or(hunt_ids.len()),
        first_failed.is_none(),
    );
    if repair.deferred > 0 {
        warn!(
            deferred = repair.deferred,
            dangling = state.dangling_label_count(),
            "label repair deferred until every hunt can be fetched"
        );
    }

    let mut outcomes = Vec::with_capacity(hunt_ids.len());
    for hunt in state.hunts.iter_mut() {
        let before = hunt.stats;
        let fetch = match sample_sets.get(&hunt.id) {
            Some(samples) => {
                hunt.stats = compute_hunt_stats(&hunt.id, samples, &state.labels);
                FetchOutcome::Ok {
                    samples: samples.len(),
                }
            }
            None => FetchOutcome::Failed {
                error: fetch_errors.remove(&hunt.id).unwrap_or_default(),
            },
        };

        if before != hunt.stats {
            info!(
                hunt = hunt.id.as_str(),
                tp = %format_args!("{} -> {}", before.true_positives, hunt.stats.true_positives),
                fp = %format_args!("{} -> {}", before.false_positives, hunt.stats.false_positives),
                pre_labeled = %format_args!("{} -> {}", before.pre_labeled, hunt.stats.pre_labeled),
                unlabeled = %format_args!("{} -> {}", before.unlabeled, hunt.stats.unlabeled),
                "hunt stats changed"
            );
        }

        let metadata = refresh_metadata(hunt, source);
        outcomes.push(HuntOutcome {
            hunt_id: hunt.id.clone(),
            name: hunt.name.clone(),
            fetch,
            metadata,
            before,
            after: hunt.stats,
        });
    }

    let report = ReconcileReport {
        hunts: hunt_ids.len(),
        outcomes,
        reassigned: repair.reassigned,
        removed: repair.removed,
        deferred: repair.deferred,
    };
    info!(
        complete = report.is_complete(),
        reassigned = report.reassigned,
        removed = report.removed,
        deferred = report.deferred,
        "reconciliation finished"
    );
    report
}

fn refresh_metadata(hunt: &mut Hunt, source: &dyn HuntSource) -> MetadataOutcome {
    if !hunt.needs_metadata() {
        return MetadataOutcome::Present;
    }

    match source.fetch_hunt_details(&hunt.id) {
        Ok(details) => apply_details(hunt, &details),
        Err(err) => {
            warn!(hunt = hunt.id.as_str(), error = %err, "metadata fetch failed");
            MetadataOutcome::Failed {
                error: err.to_string(),
            }
        }
    }
}

/// Attach upstream details to a hunt; only completed hunts get metadata.
pub(crate) fn apply_details(hunt: &mut Hunt, details: &HuntDetails) -> MetadataOutcome {
    let status = normalize_status(&details.status);
    hunt.upstream_status = Some(status.clone());

    if !details.is_completed() {
        warn!(hunt = hunt.id.as_str(), status = status.as_str(), "hunt is not completed");
        hunt.status_warning = Some(status_warning(&status));
        return MetadataOutcome::StatusWarning {
            upstream_status: status,
        };
    }

    hunt.status_warning = None;
    if hunt.timeframe.is_none() {
        hunt.timeframe = details.timeframe();
    }
    if hunt.rule_source.as_deref().is_none_or(str::is_empty) {
        hunt.rule_source = details.rule_source().map(str::to_string);
    }
    debug!(hunt = hunt.id.as_str(), "backfilled metadata");
    MetadataOutcome::Backfilled
}

/// Analyst-facing warning for a hunt that is not completed upstream.
#[must_use]
pub fn status_warning(status: &str) -> String {
    format!("Hunt has status \"{status}\" (not COMPLETED)")
}
