//! Live hunt-jobs REST client.

use std::time::Duration;

use tracing::debug;

use super::{HuntDetails, HuntSource, wire};
use crate::error::UpstreamError;
use crate::model::Sample;

pub const DEFAULT_BASE_URL: &str = "https://platform.sublime.security/v0";

const USER_AGENT: &str = concat!("huntdiff/", env!("CARGO_PKG_VERSION"));

/// Connect/read/write timeouts for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            read: Duration::from_secs(30),
            write: Duration::from_secs(30),
        }
    }
}

/// [`HuntSource`] backed by the upstream REST API.
pub struct HttpHuntSource {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpHuntSource {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeouts: Timeouts) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeouts.connect)
            .timeout_read(timeouts.read)
            .timeout_write(timeouts.write)
            .user_agent(USER_AGENT)
            .build();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            agent,
        }
    }

    fn get_body(&self, hunt_id: &str, url: &str) -> Result<String, UpstreamError> {
        debug!(url, "GET");

        let mut request = self.agent.get(url).set("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let response = request.call().map_err(|err| {
            let reason = match err {
                ureq::Error::Status(code, response) => {
                    let body = response.into_string().unwrap_or_default();
                    format!("status {code}: {}", body.trim())
                }
                ureq::Error::Transport(transport) => transport.to_string(),
            };
            UpstreamError::Request {
                hunt_id: hunt_id.to_string(),
                reason,
            }
        })?;

        response.into_string().map_err(|err| UpstreamError::Request {
            hunt_id: hunt_id.to_string(),
            reason: format!("failed to read response body: {err}"),
        })
    }
}

impl HuntSource for HttpHuntSource {
    fn fetch_hunt_results(&self, hunt_id: &str) -> Result<Vec<Sample>, UpstreamError> {
        let url = format!("{}/hunt-jobs/{hunt_id}/results", self.base_url);
        let body = self.get_body(hunt_id, &url)?;
        wire::parse_results(&body).map_err(|err| UpstreamError::Decode {
            hunt_id: hunt_id.to_string(),
            reason: err.to_string(),
        })
    }

    fn fetch_hunt_details(&self, hunt_id: &str) -> Result<HuntDetails, UpstreamError> {
        let url = format!("{}/hunt-jobs/{hunt_id}", self.base_url);
        let body = self.get_body(hunt_id, &url)?;
        serde_json::from_str(&body).map_err(|err| UpstreamError::Decode {
            hunt_id: hunt_id.to_string(),
            reason: err.to_string(),
        })
    }
}
