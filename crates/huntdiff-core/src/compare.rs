//! Comparing two fully labeled hunts: retained, eliminated, new, and
//! missing true positives, a verdict, and a rule-source diff.
//!
//! The comparison is read-only. Sample sets are fetched fresh; cached stats
//! are used only for the fully-labeled precondition.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::diff::{self, DiffSpan};
use crate::error::{EngineError, ErrorCode};
use crate::model::{Classification, Hunt, HuntStats, Sample, Timeframe};
use crate::state::AggregateState;
use crate::upstream::HuntSource;

pub const UNKNOWN_HUNT: &str = "Unknown Hunt";

/// Start or duration differences above this many minutes trigger a warning.
const TIMEFRAME_TOLERANCE_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HuntSummary {
    pub id: String,
    pub name: String,
    pub samples: usize,
    pub stats: HuntStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_warning: Option<String>,
}

/// A sample present in both hunts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedSample {
    pub id: String,
    pub prev_subject: String,
    pub curr_subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRef {
    pub id: String,
    pub subject: String,
}

/// A globally labeled true positive the current hunt does not match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingTruePositive {
    pub id: String,
    pub subject: String,
    pub hunt_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub fp_reduction_count: usize,
    pub fp_reduction_percent: f64,
    pub tp_retention_percent: f64,
    pub new_tp_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Success,
    Warning,
    Danger,
}

impl VerdictKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub kind: VerdictKind,
    pub message: String,
}

/// Result of [`compare_hunts`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub previous: HuntSummary,
    pub current: HuntSummary,
    pub prev_true_positives: usize,
    pub prev_false_positives: usize,
    pub curr_true_positives: usize,
    pub timeframe_warning: Option<String>,
    /// Advisory status warnings already attached to either hunt.
    pub status_warnings: Vec<String>,
    pub common_true_positives: Vec<SharedSample>,
    pub missing_true_positives: Vec<SampleRef>,
    pub common_false_positives: Vec<SharedSample>,
    pub eliminated_false_positives: Vec<SampleRef>,
    pub new_true_positives: Vec<SampleRef>,
    pub missing_all_true_positives: Vec<MissingTruePositive>,
    pub metrics: Metrics,
    pub verdict: Verdict,
    pub rule_diff: Vec<DiffSpan>,
    pub rule_diff_html: String,
}

fn ensure_fully_labeled(hunt: &Hunt) -> Result<(), EngineError> {
    let total = hunt.stats.total_samples;
    let labeled = hunt.stats.credited_labeled();
    info!(
        hunt = hunt.id.as_str(),
        labeled,
        total,
        pre_labeled = hunt.stats.pre_labeled,
        "checking labels before comparison"
    );
    if hunt.stats.is_fully_labeled() {
        return Ok(());
    }
    warn!(hunt = hunt.id.as_str(), labeled, total, "hunt not fully labeled");
    Err(EngineError::validation(
        ErrorCode::IncompleteLabels,
        format!(
            "cannot compare: \"{}\" ({total} samples, {labeled}/{total} labeled) is not fully labeled; \
             label all samples first",
            hunt.name
        ),
    ))
}

/// Percentage of `part` in `whole`, or 0 when `whole` is empty.
#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Advisory warning when two hunts searched different time ranges.
///
/// Checks run in order and the first match wins: non-overlapping ranges,
/// then durations, then start times. Unparseable bounds give no warning.
#[must_use]
pub fn timeframe_warning(previous: &Timeframe, current: &Timeframe) -> Option<String> {
    let (prev_start, prev_end) = previous.bounds()?;
    let (curr_start, curr_end) = current.bounds()?;

    if prev_end < curr_start || curr_end < prev_start {
        return Some("WARNING: Hunts have non-overlapping time ranges!".to_string());
    }

    let duration_diff = (previous.duration_minutes - current.duration_minutes).abs();
    if duration_diff > TIMEFRAME_TOLERANCE_MINUTES {
        return Some(format!(
            "WARNING: Hunt durations differ by {duration_diff} minutes"
        ));
    }

    let start_diff_seconds = (prev_start - curr_start).num_seconds().abs();
    if start_diff_seconds > TIMEFRAME_TOLERANCE_MINUTES * 60 {
        return Some(format!(
            "WARNING: Hunt start times differ by {} minutes",
            start_diff_seconds / 60
        ));
    }

    None
}

/// Decision table over (missing true positives, eliminated false positives).
#[must_use]
pub fn verdict(missing_all_tp: usize, metrics: &Metrics) -> Verdict {
    let pct = metrics.fp_reduction_percent;
    let new_tp = metrics.new_tp_count;

    match (missing_all_tp, metrics.fp_reduction_count) {
        (0, reduced) if reduced > 0 => {
            let mut message = format!(
                "Rule improvement: Current rule detects all true positives and reduces false positives by {pct:.1}%."
            );
            if new_tp > 0 {
                message.push_str(&format!(" Additionally, it found {new_tp} new true positives."));
            }
            Verdict {
                kind: VerdictKind::Success,
                message,
            }
        }
        (missed, reduced) if reduced > 0 => {
            let mut message = format!(
                "Mixed results: Current rule reduces false positives by {pct:.1}% but misses {missed} true positives."
            );
            if new_tp > 0 {
                message.push_str(&format!(" However, it found {new_tp} new true positives."));
            }
            Verdict {
                kind: VerdictKind::Warning,
                message,
            }
        }
        (0, _) => {
            let mut message = "Mixed results: Current rule maintains all true positives but did not reduce false positives.".to_string();
            let kind = if new_tp > 0 {
                message.push_str(&format!(
                    " However, it found {new_tp} new true positives, which is positive."
                ));
                VerdictKind::Success
            } else {
                VerdictKind::Warning
            };
            Verdict { kind, message }
        }
        (missed, _) => {
            let mut message = format!(
                "Possible regression: Current rule misses {missed} true positives and didn't reduce false positives."
            );
            if new_tp > 0 {
                message.push_str(&format!(
                    " It did find {new_tp} new true positives, but the overall change appears negative."
                ));
            }
            Verdict {
                kind: VerdictKind::Danger,
                message,
            }
        }
    }
}

/// Samples labeled `classification`, first occurrence of each id, in order.
fn labeled_in<'a>(
    samples: &'a [Sample],
    state: &AggregateState,
    classification: Classification,
) -> Vec<&'a Sample> {
    let mut seen: HashSet<String> = HashSet::new();
    samples
        .iter()
        .filter(|s| {
            state.labels.classification_of(&s.id) == Some(classification) && seen.insert(s.id.clone())
        })
        .collect()
}

fn summary(hunt: &Hunt, samples: usize) -> HuntSummary {
    HuntSummary {
        id: hunt.id.clone(),
        name: hunt.name.clone(),
        samples,
        stats: hunt.stats,
        timeframe: hunt.timeframe.clone(),
        status_warning: hunt.status_warning.clone(),
    }
}

/// Compare `previous_id` (baseline) against `current_id`.
///
/// # Errors
///
/// - [`EngineError::Validation`] for blank or identical ids, or when either
///   hunt is not fully labeled (the message names the hunt and its counts).
/// - [`EngineError::NotFound`] if either hunt is not registered.
/// - [`EngineError::Upstream`] if either sample set cannot be fetched.
pub fn compare_hunts(
    state: &AggregateState,
    source: &dyn HuntSource,
    previous_id: &str,
    current_id: &str,
) -> Result<Comparison, EngineError> {
    if previous_id.trim().is_empty() {
        return Err(EngineError::missing("previous"));
    }
    if current_id.trim().is_empty() {
        return Err(EngineError::missing("current"));
    }
    if previous_id == current_id {
        return Err(EngineError::validation(
            ErrorCode::SameHunt,
            format!("select two different hunts to compare (got '{previous_id}' twice)"),
        ));
    }

    let previous = state
        .hunts
        .get(previous_id)
        .ok_or_else(|| EngineError::hunt_not_found(previous_id))?;
    let current = state
        .hunts
        .get(current_id)
        .ok_or_else(|| EngineError::hunt_not_found(current_id))?;
    info!(previous = previous_id, current = current_id, "comparing hunts");

    ensure_fully_labeled(previous)?;
    ensure_fully_labeled(current)?;

    let prev_samples = source.fetch_hunt_results(previous_id)?;
    let curr_samples = source.fetch_hunt_results(current_id)?;

    let curr_subjects: HashMap<&str, &str> = curr_samples
        .iter()
        .map(|s| (s.id.as_str(), s.subject.as_str()))
        .collect();

    let prev_tp = labeled_in(&prev_samples, state, Classification::TruePositive);
    let prev_fp = labeled_in(&prev_samples, state, Classification::FalsePositive);
    let curr_tp = labeled_in(&curr_samples, state, Classification::TruePositive);
    let prev_tp_ids: HashSet<&str> = prev_tp.iter().map(|s| s.id.as_str()).collect();

    let split = |samples: &[&Sample]| -> (Vec<SharedSample>, Vec<SampleRef>) {
        let mut shared = Vec::new();
        let mut gone = Vec::new();
        for sample in samples {
            match curr_subjects.get(sample.id.as_str()) {
                Some(curr_subject) => shared.push(SharedSample {
                    id: sample.id.clone(),
                    prev_subject: sample.subject.clone(),
                    curr_subject: (*curr_subject).to_string(),
                }),
                None => gone.push(SampleRef {
                    id: sample.id.clone(),
                    subject: sample.subject.clone(),
                }),
            }
        }
        (shared, gone)
    };

    let (common_true_positives, missing_true_positives) = split(&prev_tp);
    let (common_false_positives, eliminated_false_positives) = split(&prev_fp);

    let new_true_positives: Vec<SampleRef> = curr_tp
        .iter()
        .filter(|s| !prev_tp_ids.contains(s.id.as_str()))
        .map(|s| SampleRef {
            id: s.id.clone(),
            subject: s.subject.clone(),
        })
        .collect();

    let missing_all_true_positives: Vec<MissingTruePositive> = state
        .labels
        .with_classification(Classification::TruePositive)
        .filter(|r| !curr_subjects.contains_key(r.sample_id.as_str()))
        .map(|r| MissingTruePositive {
            id: r.sample_id.clone(),
            subject: r.cached_subject.clone(),
            hunt_name: state
                .hunts
                .name_of(&r.origin_hunt_id)
                .unwrap_or(UNKNOWN_HUNT)
                .to_string(),
        })
        .collect();

    let metrics = Metrics {
        fp_reduction_count: eliminated_false_positives.len(),
        fp_reduction_percent: percent(eliminated_false_positives.len(), prev_fp.len()),
        tp_retention_percent: percent(common_true_positives.len(), prev_tp.len()),
        new_tp_count: new_true_positives.len(),
    };
    let verdict = verdict(missing_all_true_positives.len(), &metrics);
    info!(
        kind = verdict.kind.as_str(),
        fp_reduction = metrics.fp_reduction_count,
        missing_tp = missing_all_true_positives.len(),
        new_tp = metrics.new_tp_count,
        "comparison verdict"
    );

    let timeframe_warning = match (&previous.timeframe, &current.timeframe) {
        (Some(prev), Some(curr)) => timeframe_warning(prev, curr),
        _ => None,
    };
    if let Some(warning) = &timeframe_warning {
        warn!(warning = warning.as_str(), "timeframe mismatch");
    }

    let status_warnings = [previous, current]
        .iter()
        .filter_map(|h| {
            h.status_warning
                .as_ref()
                .map(|w| format!("{}: {w}", h.name))
        })
        .collect();

    let prev_source = previous.rule_source.as_deref().unwrap_or_default();
    let curr_source = current.rule_source.as_deref().unwrap_or_default();

    Ok(Comparison {
        previous: summary(previous, prev_samples.len()),
        current: summary(current, curr_samples.len()),
        prev_true_positives: prev_tp.len(),
        prev_false_positives: prev_fp.len(),
        curr_true_positives: curr_tp.len(),
        timeframe_warning,
        status_warnings,
        common_true_positives,
        missing_true_positives,
        common_false_positives,
        eliminated_false_positives,
        new_true_positives,
        missing_all_true_positives,
        metrics,
        verdict,
        rule_diff: diff::diff(prev_source, curr_source),
        rule_diff_html: diff::render_html(prev_source, curr_source),
    })
}
