//! Per-hunt presentation: one row per sample plus live counts.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::model::{Classification, Hunt, HuntStats, Sample};
use crate::state::AggregateState;
use crate::stats::compute_hunt_stats;
use crate::upstream::HuntSource;

pub const MESSAGE_LINK_BASE: &str = "https://platform.sublime.security/messages";

const MAX_RECIPIENTS: usize = 3;
const MAX_RULES: usize = 5;

/// One sample as shown in the hunt view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRow {
    pub id: String,
    pub subject: String,
    pub status: Option<Classification>,
    /// Labeled while working on another hunt.
    pub pre_labeled: bool,
    /// Owning hunt of the label, when pre-labeled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labeled_in: Option<String>,
    pub sender: Option<String>,
    /// First three recipients.
    pub recipients: Vec<String>,
    pub recipient_count: usize,
    pub date: Option<String>,
    /// First five rule names.
    pub rules: Vec<String>,
    pub rule_count: usize,
    pub message_link: String,
}

/// Result of [`analyze_hunt`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HuntView {
    /// The hunt with its cached stats replaced by the live ones.
    pub hunt: Hunt,
    pub cached_stats: HuntStats,
    /// Live TP, FP, or total differ from the cached values; reprocessing
    /// will fix the cache.
    pub counts_mismatch: bool,
    pub first_view: bool,
    pub show_all: bool,
    /// Pre-labeled rows left out because `show_all` was off.
    pub hidden_pre_labeled: usize,
    pub rows: Vec<SampleRow>,
}

fn row(sample: &Sample, state: &AggregateState, hunt_id: &str) -> SampleRow {
    let label = state.labels.lookup(&sample.id);
    let pre_labeled = label.is_some_and(|r| r.is_pre_labeled_for(hunt_id));

    SampleRow {
        id: sample.id.clone(),
        subject: sample.subject.clone(),
        status: label.map(|r| r.classification),
        pre_labeled,
        labeled_in: label
            .filter(|_| pre_labeled)
            .map(|r| r.origin_hunt_id.clone()),
        sender: sample.sender.clone(),
        recipients: sample.recipients.iter().take(MAX_RECIPIENTS).cloned().collect(),
        recipient_count: sample.recipients.len(),
        date: sample.timestamp.clone(),
        rules: sample.rules.iter().take(MAX_RULES).cloned().collect(),
        rule_count: sample.rules.len(),
        message_link: format!("{MESSAGE_LINK_BASE}/{}", sample.id),
    }
}

/// Build the view of one hunt from a fresh fetch of its samples.
///
/// Live stats are computed but not stored; the only change to `state` is
/// marking the hunt as viewed.
///
/// # Errors
///
/// - [`EngineError::NotFound`] if the hunt is not registered.
/// - [`EngineError::Upstream`] if its samples cannot be fetched.
pub fn analyze_hunt(
    state: &mut AggregateState,
    source: &dyn HuntSource,
    hunt_id: &str,
    show_all: bool,
) -> Result<HuntView, EngineError> {
    let Some(hunt) = state.hunts.get(hunt_id) else {
        return Err(EngineError::hunt_not_found(hunt_id));
    };
    let mut hunt = hunt.clone();

    let samples = source.fetch_hunt_results(hunt_id)?;
    let live = compute_hunt_stats(hunt_id, &samples, &state.labels);
    let cached = hunt.stats;

    let counts_mismatch = live.true_positives != cached.true_positives
        || live.false_positives != cached.false_positives
        || live.total_samples != cached.total_samples;
    if counts_mismatch {
        warn!(
            hunt = hunt_id,
            stored_tp = cached.true_positives,
            live_tp = live.true_positives,
            stored_fp = cached.false_positives,
            live_fp = live.false_positives,
            stored_total = cached.total_samples,
            live_total = samples.len(),
            "count mismatch, reprocess to refresh cached stats"
        );
    }

    let mut rows = Vec::with_capacity(samples.len());
    let mut hidden_pre_labeled = 0;
    for sample in &samples {
        let row = row(sample, state, hunt_id);
        if row.pre_labeled && !show_all {
            hidden_pre_labeled += 1;
            continue;
        }
        rows.push(row);
    }
    if hidden_pre_labeled > 0 {
        debug!(hunt = hunt_id, hidden = hidden_pre_labeled, "hiding pre-labeled samples");
    }

    let first_view = !hunt.pre_labeled_viewed;
    if first_view {
        if let Some(stored) = state.hunts.get_mut(hunt_id) {
            stored.pre_labeled_viewed = true;
        }
        info!(hunt = hunt_id, "marked hunt as viewed");
    }

    hunt.stats = live;
    hunt.pre_labeled_viewed = true;
    Ok(HuntView {
        hunt,
        cached_stats: cached,
        counts_mismatch,
        first_view,
        show_all,
        hidden_pre_labeled,
        rows,
    })
}
