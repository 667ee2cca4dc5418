//! Per-hunt statistics as a pure function of (sample set, label store).

use crate::labels::LabelStore;
use crate::model::{Classification, HuntStats, Sample};

/// Compute a hunt's counts from its sample set and the global labels.
///
/// Duplicate sample ids in `samples` are counted once per occurrence,
/// matching how the upstream list is displayed.
#[must_use]
pub fn compute_hunt_stats(hunt_id: &str, samples: &[Sample], labels: &LabelStore) -> HuntStats {
    let mut true_positives = 0_usize;
    let mut false_positives = 0_usize;
    let mut pre_labeled = 0_usize;

    for sample in samples {
        let Some(record) = labels.lookup(&sample.id) else {
            continue;
        };
        match record.classification {
            Classification::TruePositive => true_positives += 1,
            Classification::FalsePositive => false_positives += 1,
        }
        if record.is_pre_labeled_for(hunt_id) {
            pre_labeled += 1;
        }
    }

    let total_samples = samples.len();
    let total_new_samples = total_samples.saturating_sub(pre_labeled);
    let labeled_new_samples = (true_positives + false_positives).saturating_sub(pre_labeled);

    HuntStats {
        true_positives,
        false_positives,
        pre_labeled,
        total_new_samples,
        labeled_new_samples,
        unlabeled: total_new_samples.saturating_sub(labeled_new_samples),
        total_samples,
    }
}
