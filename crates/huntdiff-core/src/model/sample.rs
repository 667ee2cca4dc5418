use serde::{Deserialize, Serialize};

/// Subject used when the upstream service has no message for a sample.
pub const NO_SUBJECT: &str = "No subject";

/// One matched message group returned by an upstream hunt.
///
/// Samples are never persisted on their own; only the id and subject are
/// cached inside label records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub subject: String,
    /// `"Display Name <address>"` of the first message's sender.
    pub sender: Option<String>,
    pub recipients: Vec<String>,
    /// Names of the detection rules that flagged this sample.
    pub rules: Vec<String>,
    /// Upstream creation timestamp, verbatim.
    pub timestamp: Option<String>,
}

impl Sample {
    /// Minimal sample carrying only an id and a subject.
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            sender: None,
            recipients: Vec::new(),
            rules: Vec::new(),
            timestamp: None,
        }
    }
}
