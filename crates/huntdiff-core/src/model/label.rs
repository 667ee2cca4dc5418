use serde::{Deserialize, Serialize};

use super::classification::Classification;

/// The current classification of one sample.
///
/// `origin_hunt_id` names the hunt whose labeling action owns this
/// classification. It is used for pre-labeled detection and for
/// reassignment when that hunt is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub sample_id: String,
    pub classification: Classification,
    pub origin_hunt_id: String,
    pub cached_subject: String,
}

impl LabelRecord {
    /// True when the label is owned by a hunt other than `hunt_id`.
    #[must_use]
    pub fn is_pre_labeled_for(&self, hunt_id: &str) -> bool {
        self.origin_hunt_id != hunt_id
    }
}
