use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The verdict an analyst assigns to a matched sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    TruePositive,
    FalsePositive,
}

impl Classification {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TruePositive => "true_positive",
            Self::FalsePositive => "false_positive",
        }
    }

    /// The other of the two classifications.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::TruePositive => Self::FalsePositive,
            Self::FalsePositive => Self::TruePositive,
        }
    }
}

/// Error returned when parsing a classification from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid classification: '{got}'")]
pub struct ParseClassificationError {
    pub got: String,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = ParseClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "true_positive" | "tp" => Ok(Self::TruePositive),
            "false_positive" | "fp" => Ok(Self::FalsePositive),
            _ => Err(ParseClassificationError { got: s.to_string() }),
        }
    }
}
