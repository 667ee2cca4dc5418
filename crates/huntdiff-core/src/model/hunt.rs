use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timeframe::Timeframe;

/// Upstream status a hunt must report before it can be imported.
pub const COMPLETED_STATUS: &str = "COMPLETED";

/// Cached per-hunt counts.
///
/// These are a snapshot of (hunt sample set, label store) taken at the last
/// recomputation. They are not kept in sync on every label change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntStats {
    pub true_positives: usize,
    pub false_positives: usize,
    /// Samples in this hunt whose label is owned by another hunt.
    pub pre_labeled: usize,
    pub total_new_samples: usize,
    pub labeled_new_samples: usize,
    pub unlabeled: usize,
    pub total_samples: usize,
}

impl HuntStats {
    /// Labeled count used by the comparison precondition.
    ///
    /// When some samples were pre-labeled elsewhere and the raw TP+FP count
    /// falls short of the total, the pre-labeled samples are credited on top,
    /// capped at the total.
    #[must_use]
    pub fn credited_labeled(&self) -> usize {
        let categorized = self.true_positives + self.false_positives;
        if self.pre_labeled > 0 && categorized < self.total_samples {
            self.total_samples.min(categorized + self.pre_labeled)
        } else {
            categorized
        }
    }

    #[must_use]
    pub fn is_fully_labeled(&self) -> bool {
        self.credited_labeled() == self.total_samples
    }
}

/// A named run of a detection query plus its cached statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hunt {
    /// Analyst-supplied id; matches the upstream hunt job id.
    pub id: String,
    pub name: String,
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub stats: HuntStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_warning: Option<String>,
    /// Set once the hunt has been opened in the hunt view.
    #[serde(default)]
    pub pre_labeled_viewed: bool,
}

impl Hunt {
    pub fn new(id: impl Into<String>, name: impl Into<String>, date_added: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date_added,
            stats: HuntStats::default(),
            timeframe: None,
            rule_source: None,
            upstream_status: None,
            status_warning: None,
            pre_labeled_viewed: false,
        }
    }

    /// True when reconciliation should fetch details to fill in metadata.
    #[must_use]
    pub fn needs_metadata(&self) -> bool {
        self.timeframe.is_none() || self.rule_source.as_deref().is_none_or(str::is_empty)
    }
}

/// Normalize an upstream status for comparison (`completed` → `COMPLETED`).
#[must_use]
pub fn normalize_status(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[must_use]
pub fn is_completed(raw: &str) -> bool {
    normalize_status(raw) == COMPLETED_STATUS
}
