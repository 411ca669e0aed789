use thiserror::Error;

use crate::domain::weights::{WEIGHT_MAX, WEIGHT_MIN};

/// Minimum number of usable rows the classifier accepts, independent of any
/// caller-supplied `min_samples` threshold.
pub const MIN_TRAINING_ROWS: usize = 20;

/// Errors that abort an entire retraining cycle.
///
/// Per-record problems are not represented here: a malformed outcome record
/// is logged and skipped where it is encountered (see [`MalformedRecord`]),
/// and only becomes fatal when every record fails (`FeatureBuildFailed`).
#[derive(Debug, Error)]
pub enum RetrainError {
    #[error("no outcome records available for training")]
    NoData,

    #[error("insufficient samples: {have} < {need}")]
    InsufficientSamples { have: usize, need: usize },

    #[error("feature build failed: all {total} outcome records were malformed")]
    FeatureBuildFailed { total: usize },

    #[error("insufficient training data: {rows} usable rows, need at least {MIN_TRAINING_ROWS}")]
    InsufficientData { rows: usize },

    #[error("weight for {indicator} must be between {WEIGHT_MIN} and {WEIGHT_MAX}, got {value}")]
    InvalidWeight { indicator: String, value: f64 },

    #[error("unknown indicator: {indicator}")]
    UnknownIndicator { indicator: String },

    #[error("outcome source error: {0}")]
    Source(#[from] anyhow::Error),
}

/// Why a single outcome record could not be turned into a training row.
///
/// Never propagated past the feature builder; the offending record is
/// skipped with a warning.
#[derive(Debug, Error)]
pub enum MalformedRecord {
    #[error("indicators_hit is not a JSON object: {reason}")]
    NotAMapping { reason: String },

    #[error("indicator {name} has a non-numeric value")]
    NonNumericIndicator { name: String },

    #[error("invalid direction: {value}")]
    InvalidDirection { value: String },

    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: i64 },

    #[error("non-finite numeric field: {field}")]
    NonFiniteField { field: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_samples_formatting() {
        let err = RetrainError::InsufficientSamples { have: 10, need: 50 };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn test_invalid_weight_formatting() {
        let err = RetrainError::InvalidWeight {
            indicator: "RSI".to_string(),
            value: 2.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("RSI"));
        assert!(msg.contains("2.5"));
        assert!(msg.contains("0.1"));
    }

    #[test]
    fn test_insufficient_data_names_hard_floor() {
        let err = RetrainError::InsufficientData { rows: 12 };
        assert!(err.to_string().contains("20"));
    }
}
