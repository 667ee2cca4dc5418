//! The upstream hunting service: where sample sets and hunt metadata come from.
//!
//! Engine operations only see the [`HuntSource`] trait. Three
//! implementations ship with the crate:
//!
//! - [`http::HttpHuntSource`] talks to the live REST API.
//! - [`snapshot::SnapshotSource`] replays JSON responses saved on disk.
//! - [`memory::MemorySource`] holds fixtures in memory.

pub mod http;
pub mod memory;
pub mod snapshot;
mod wire;

use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::model::{Sample, Timeframe};
use crate::model::hunt::is_completed;

pub use http::HttpHuntSource;
pub use memory::MemorySource;
pub use snapshot::SnapshotSource;

/// Hunt job metadata reported by the upstream service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntDetails {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub range_start_time: Option<String>,
    #[serde(default)]
    pub range_end_time: Option<String>,
    /// Rule source text the hunt ran.
    #[serde(default)]
    pub source: Option<String>,
}

impl HuntDetails {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        is_completed(&self.status)
    }

    /// Parsed time range, when both bounds are present and valid.
    #[must_use]
    pub fn timeframe(&self) -> Option<Timeframe> {
        match (&self.range_start_time, &self.range_end_time) {
            (Some(start), Some(end)) => Timeframe::parse(start, end),
            _ => None,
        }
    }

    /// Rule source, treating an empty string as absent.
    #[must_use]
    pub fn rule_source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }
}

/// Read access to the upstream hunting service.
///
/// Calls are synchronous and may block on network I/O.
pub trait HuntSource {
    /// Samples matched by a hunt, in upstream order.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport failure, non-success status,
    /// or an undecodable body.
    fn fetch_hunt_results(&self, hunt_id: &str) -> Result<Vec<Sample>, UpstreamError>;

    /// Status, time range, and rule source of a hunt.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`HuntSource::fetch_hunt_results`].
    fn fetch_hunt_details(&self, hunt_id: &str) -> Result<HuntDetails, UpstreamError>;
}

impl<T: HuntSource + ?Sized> HuntSource for &T {
    fn fetch_hunt_results(&self, hunt_id: &str) -> Result<Vec<Sample>, UpstreamError> {
        (**self).fetch_hunt_results(hunt_id)
    }

    fn fetch_hunt_details(&self, hunt_id: &str) -> Result<HuntDetails, UpstreamError> {
        (**self).fetch_hunt_details(hunt_id)
    }
}

impl<T: HuntSource + ?Sized> HuntSource for Box<T> {
    fn fetch_hunt_results(&self, hunt_id: &str) -> Result<Vec<Sample>, UpstreamError> {
        (**self).fetch_hunt_results(hunt_id)
    }

    fn fetch_hunt_details(&self, hunt_id: &str) -> Result<HuntDetails, UpstreamError> {
        (**self).fetch_hunt_details(hunt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::HuntDetails;

    #[test]
    fn details_helpers() {
        let details = HuntDetails {
            status: "completed".to_string(),
            range_start_time: Some("2024-01-01T00:00:00Z".to_string()),
            range_end_time: Some("2024-01-01T01:00:00Z".to_string()),
            source: Some(String::new()),
        };
        assert!(details.is_completed());
        assert_eq!(details.timeframe().unwrap().duration_minutes, 60);
        assert!(details.rule_source().is_none());

        let partial = HuntDetails {
            range_end_time: None,
            ..details
        };
        assert!(partial.timeframe().is_none());
    }

    #[test]
    fn details_decode_with_missing_fields() {
        let details: HuntDetails = serde_json::from_str(r#"{"status":"RUNNING"}"#).unwrap();
        assert!(!details.is_completed());
        assert!(details.source.is_none());
    }
}
