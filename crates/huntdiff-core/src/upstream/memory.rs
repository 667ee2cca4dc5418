//! In-memory [`HuntSource`] for embedding callers and tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::{HuntDetails, HuntSource};
use crate::error::UpstreamError;
use crate::model::Sample;

/// Hunts held in memory, with optional injected failures and call counting.
#[derive(Debug, Default)]
pub struct MemorySource {
    results: HashMap<String, Vec<Sample>>,
    details: HashMap<String, HuntDetails>,
    failing: HashSet<String>,
    result_calls: RefCell<HashMap<String, usize>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hunt's samples and details.
    pub fn insert(&mut self, hunt_id: &str, samples: Vec<Sample>, details: HuntDetails) {
        self.results.insert(hunt_id.to_string(), samples);
        self.details.insert(hunt_id.to_string(), details);
    }

    /// Register a completed hunt with the given samples.
    pub fn insert_completed(&mut self, hunt_id: &str, samples: Vec<Sample>) {
        let details = HuntDetails {
            status: crate::model::COMPLETED_STATUS.to_string(),
            range_start_time: Some("2024-01-01T00:00:00Z".to_string()),
            range_end_time: Some("2024-01-08T00:00:00Z".to_string()),
            source: Some(format!("// rule for {hunt_id}")),
        };
        self.insert(hunt_id, samples, details);
    }

    pub fn details_mut(&mut self, hunt_id: &str) -> Option<&mut HuntDetails> {
        self.details.get_mut(hunt_id)
    }

    /// Make every call for `hunt_id` fail (or succeed again).
    pub fn set_failing(&mut self, hunt_id: &str, failing: bool) {
        if failing {
            self.failing.insert(hunt_id.to_string());
        } else {
            self.failing.remove(hunt_id);
        }
    }

    /// How many times the results of `hunt_id` were fetched.
    #[must_use]
    pub fn result_calls(&self, hunt_id: &str) -> usize {
        self.result_calls.borrow().get(hunt_id).copied().unwrap_or(0)
    }

    fn check(&self, hunt_id: &str) -> Result<(), UpstreamError> {
        if self.failing.contains(hunt_id) {
            return Err(UpstreamError::Request {
                hunt_id: hunt_id.to_string(),
                reason: "status 503: injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn unknown(hunt_id: &str) -> UpstreamError {
        UpstreamError::Request {
            hunt_id: hunt_id.to_string(),
            reason: "status 404: hunt job not found".to_string(),
        }
    }
}

impl HuntSource for MemorySource {
    fn fetch_hunt_results(&self, hunt_id: &str) -> Result<Vec<Sample>, UpstreamError> {
        *self
            .result_calls
            .borrow_mut()
            .entry(hunt_id.to_string())
            .or_default() += 1;
        self.check(hunt_id)?;
        self.results
            .get(hunt_id)
            .cloned()
            .ok_or_else(|| Self::unknown(hunt_id))
    }

    fn fetch_hunt_details(&self, hunt_id: &str) -> Result<HuntDetails, UpstreamError> {
        self.check(hunt_id)?;
        self.details
            .get(hunt_id)
            .cloned()
            .ok_or_else(|| Self::unknown(hunt_id))
    }
}
