//! Offline replay of saved upstream responses.
//!
//! Layout on disk, one directory per hunt id:
//!
//! ```text
//! <root>/<hunt_id>/results.json   # body of GET /hunt-jobs/<id>/results
//! <root>/<hunt_id>/details.json   # body of GET /hunt-jobs/<id>
//! ```

use std::fs;
use std::path::PathBuf;

use super::{HuntDetails, HuntSource, wire};
use crate::error::UpstreamError;
use crate::model::Sample;

pub const RESULTS_FILE: &str = "results.json";
pub const DETAILS_FILE: &str = "details.json";

/// [`HuntSource`] reading saved JSON responses from a directory tree.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    root: PathBuf,
}

impl SnapshotSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, hunt_id: &str, file: &str) -> Result<String, UpstreamError> {
        // Hunt ids become path components; refuse anything that could escape the root.
        if hunt_id.is_empty() || hunt_id.contains(['/', '\\']) || hunt_id == ".." {
            return Err(UpstreamError::Request {
                hunt_id: hunt_id.to_string(),
                reason: "invalid hunt id for snapshot lookup".to_string(),
            });
        }

        let path = self.root.join(hunt_id).join(file);
        fs::read_to_string(&path).map_err(|err| UpstreamError::Request {
            hunt_id: hunt_id.to_string(),
            reason: format!("cannot read snapshot {}: {err}", path.display()),
        })
    }
}

impl HuntSource for SnapshotSource {
    fn fetch_hunt_results(&self, hunt_id: &str) -> Result<Vec<Sample>, UpstreamError> {
        let body = self.read(hunt_id, RESULTS_FILE)?;
        wire::parse_results(&body).map_err(|err| UpstreamError::Decode {
            hunt_id: hunt_id.to_string(),
            reason: err.to_string(),
        })
    }

    fn fetch_hunt_details(&self, hunt_id: &str) -> Result<HuntDetails, UpstreamError> {
        let body = self.read(hunt_id, DETAILS_FILE)?;
        serde_json::from_str(&body).map_err(|err| UpstreamError::Decode {
            hunt_id: hunt_id.to_string(),
            reason: err.to_string(),
        })
    }
}
