use std::collections::HashMap;

use crate::model::Sample;

/// Which hunts contain each sample, in registry order.
///
/// Built from one fetch of each hunt's sample set. Label reassignment picks
/// [`ContainmentIndex::first_containing`], so insertion order must follow
/// the registry.
#[derive(Debug, Default)]
pub struct ContainmentIndex {
    hunts_by_sample: HashMap<String, Vec<String>>,
}

impl ContainmentIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `hunt_id` contains every sample in `samples`.
    ///
    /// Call once per hunt, in registry order.
    pub fn add_hunt(&mut self, hunt_id: &str, samples: &[Sample]) {
        for sample in samples {
            let hunts = self.hunts_by_sample.entry(sample.id.clone()).or_default();
            if hunts.last().is_none_or(|last| last != hunt_id) {
                hunts.push(hunt_id.to_string());
            }
        }
    }

    /// First hunt (in registry order) containing `sample_id`.
    #[must_use]
    pub fn first_containing(&self, sample_id: &str) -> Option<&str> {
        self.hunts_by_sample
            .get(sample_id)
            .and_then(|hunts| hunts.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, sample_id: &str) -> bool {
        self.hunts_by_sample.contains_key(sample_id)
    }
}
