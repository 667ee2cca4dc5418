use serde::{Deserialize, Serialize};

use crate::labels::LabelStore;
use crate::registry::HuntRegistry;

/// Everything huntdiff persists: the hunt registry plus the label store.
///
/// Read wholesale, mutated in memory by one engine operation, then written
/// back wholesale. There are no finer-grained transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateState {
    #[serde(default)]
    pub hunts: HuntRegistry,
    #[serde(default)]
    pub labels: LabelStore,
}

impl AggregateState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every hunt and label.
    pub fn clear(&mut self) {
        self.hunts.clear();
        self.labels.clear();
    }

    /// Labels whose origin hunt is not registered.
    #[must_use]
    pub fn dangling_label_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|r| !self.hunts.contains(&r.origin_hunt_id))
            .count()
    }
}
