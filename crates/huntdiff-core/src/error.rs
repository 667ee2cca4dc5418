use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    MissingParameter,
    DuplicateHunt,
    HuntNotCompleted,
    InvalidClassification,
    IncompleteLabels,
    SameHunt,
    HuntNotFound,
    SampleNotFound,
    UpstreamFetchFailed,
    StateReadFailed,
    StateWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::MissingParameter => "E2001",
            Self::DuplicateHunt => "E2002",
            Self::HuntNotCompleted => "E2003",
            Self::InvalidClassification => "E2004",
            Self::IncompleteLabels => "E2005",
            Self::SameHunt => "E2006",
            Self::HuntNotFound => "E3001",
            Self::SampleNotFound => "E3002",
            Self::UpstreamFetchFailed => "E4001",
            Self::StateReadFailed => "E5001",
            Self::StateWriteFailed => "E5002",
            Self::LockContention => "E5003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::MissingParameter => "Missing required parameter",
            Self::DuplicateHunt => "Hunt already added",
            Self::HuntNotCompleted => "Hunt is not completed",
            Self::InvalidClassification => "Invalid classification value",
            Self::IncompleteLabels => "Hunt is not fully labeled",
            Self::SameHunt => "Cannot compare a hunt with itself",
            Self::HuntNotFound => "Hunt not found",
            Self::SampleNotFound => "Sample not found",
            Self::UpstreamFetchFailed => "Upstream hunt service request failed",
            Self::StateReadFailed => "State file read failed",
            Self::StateWriteFailed => "State file write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to the analyst.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .huntdiff/config.toml and retry."),
            Self::MissingParameter => None,
            Self::DuplicateHunt => Some("Use `huntdiff list` to see hunts already added."),
            Self::HuntNotCompleted => {
                Some("Only import hunts whose upstream status is COMPLETED.")
            }
            Self::InvalidClassification => Some("Use one of: true_positive, false_positive."),
            Self::IncompleteLabels => {
                Some("Label every sample with `huntdiff show` / `huntdiff categorize` first.")
            }
            Self::SameHunt => Some("Pick two different hunts."),
            Self::HuntNotFound => Some("Use `huntdiff list` to see known hunt ids."),
            Self::SampleNotFound => None,
            Self::UpstreamFetchFailed => {
                Some("Check the API token, base URL, and network connectivity, then retry.")
            }
            Self::StateReadFailed => Some("Check that the data directory is readable."),
            Self::StateWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other `huntdiff` process releases its lock.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by engine operations.
///
/// Dangling label origins are deliberately absent: reconciliation repairs
/// them in place and never reports them to a caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The request was rejected before any state was touched.
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    /// A hunt or sample id is unknown.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// The upstream hunting service failed or returned a non-success status.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Loading or saving the aggregate state failed.
    #[error("{code}: {message}")]
    Persistence { code: ErrorCode, message: String },
}

impl EngineError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn missing(parameter: &str) -> Self {
        Self::validation(
            ErrorCode::MissingParameter,
            format!("missing required parameter: {parameter}"),
        )
    }

    pub fn hunt_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "hunt",
            id: id.into(),
        }
    }

    pub fn sample_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "sample",
            id: id.into(),
        }
    }

    /// Return the machine-readable error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } | Self::Persistence { code, .. } => *code,
            Self::NotFound { kind, .. } if *kind == "sample" => ErrorCode::SampleNotFound,
            Self::NotFound { .. } => ErrorCode::HuntNotFound,
            Self::Upstream(_) => ErrorCode::UpstreamFetchFailed,
        }
    }

    /// Optional remediation hint for the analyst.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// A failed call to the upstream hunting service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Transport failure or non-success HTTP status.
    #[error("upstream request for hunt {hunt_id} failed: {reason}")]
    Request { hunt_id: String, reason: String },

    /// The response body could not be decoded.
    #[error("upstream response for hunt {hunt_id} could not be decoded: {reason}")]
    Decode { hunt_id: String, reason: String },
}

impl UpstreamError {
    #[must_use]
    pub fn hunt_id(&self) -> &str {
        match self {
            Self::Request { hunt_id, .. } | Self::Decode { hunt_id, .. } => hunt_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineError, ErrorCode, UpstreamError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::MissingParameter,
            ErrorCode::DuplicateHunt,
            ErrorCode::HuntNotCompleted,
            ErrorCode::InvalidClassification,
            ErrorCode::IncompleteLabels,
            ErrorCode::SameHunt,
            ErrorCode::HuntNotFound,
            ErrorCode::SampleNotFound,
            ErrorCode::UpstreamFetchFailed,
            ErrorCode::StateReadFailed,
            ErrorCode::StateWriteFailed,
            ErrorCode::LockContention,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::IncompleteLabels.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn not_found_codes_follow_kind() {
        assert_eq!(
            EngineError::hunt_not_found("h1").code(),
            ErrorCode::HuntNotFound
        );
        assert_eq!(
            EngineError::sample_not_found("m1").code(),
            ErrorCode::SampleNotFound
        );
        assert_eq!(
            EngineError::hunt_not_found("h1").to_string(),
            "hunt 'h1' not found"
        );
    }

    #[test]
    fn upstream_errors_keep_hunt_id() {
        let err = UpstreamError::Request {
            hunt_id: "h9".to_string(),
            reason: "status 500".to_string(),
        };
        assert_eq!(err.hunt_id(), "h9");
        let engine: EngineError = err.into();
        assert_eq!(engine.code(), ErrorCode::UpstreamFetchFailed);
        assert!(engine.hint().is_some());
    }
}
