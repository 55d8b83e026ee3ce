//! Error types shared by the compute and ui crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single objective evaluation.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum EvaluationError {
    #[error("objective returned non-finite value {value}")]
    NonFinite {
        #[serde(with = "float_text")]
        value: f64,
    },

    #[error("point has dimension {actual}, objective expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("objective failed: {0}")]
    Failed(String),
}

/// JSON has no literal for NaN or infinity, so these values travel as
/// their `Display` text ("NaN", "inf", "-inf").
mod float_text {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Hand-off errors on the path channel.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelError {
    #[error("path channel closed by consumer")]
    Closed,
}

/// Rejected configuration values.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be {requirement} (got {value})")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: String,
    },

    #[error("unknown objective '{0}'")]
    UnknownObjective(String),

    #[error("start point {index} has dimension {actual}, expected {expected}")]
    StartDimension {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("no start points given")]
    NoStartPoints,
}

impl ConfigError {
    pub fn out_of_range(
        field: &'static str,
        requirement: &'static str,
        value: impl ToString,
    ) -> Self {
        Self::OutOfRange {
            field,
            requirement,
            value: value.to_string(),
        }
    }
}
