//! Domain error types.

use crate::domain::compounding::TotalLoss;
use chrono::NaiveDate;

/// Top-level error type for levsim.
#[derive(Debug, thiserror::Error)]
pub enum LevsimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to read {path}: {reason}")]
    DataRead { path: String, reason: String },

    #[error("no observations in {path}")]
    EmptySeries { path: String },

    #[error(
        "series is inconsistent: replaying daily changes from the first close gives {replayed:.2}, \
         but the last close is {last_close:.2}"
    )]
    DataIntegrity { replayed: f64, last_close: f64 },

    #[error("no valid holding window: {reason}")]
    NoSamplingRange { reason: String },

    #[error(transparent)]
    TotalLoss(#[from] TotalLoss),

    #[error("index {index} not in range of recorded trials (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LevsimError {
    pub(crate) fn no_range(lower: NaiveDate, upper: NaiveDate) -> Self {
        LevsimError::NoSamplingRange {
            reason: format!("earliest start {lower} is after latest start {upper}"),
        }
    }
}

impl From<&LevsimError> for std::process::ExitCode {
    fn from(err: &LevsimError) -> Self {
        let code: u8 = match err {
            LevsimError::Io(_) => 1,
            LevsimError::ConfigParse { .. }
            | LevsimError::ConfigMissing { .. }
            | LevsimError::ConfigInvalid { .. } => 2,
            LevsimError::NoSamplingRange { .. } | LevsimError::IndexOutOfRange { .. } => 3,
            LevsimError::TotalLoss(_) => 4,
            LevsimError::DataRead { .. }
            | LevsimError::EmptySeries { .. }
            | LevsimError::DataIntegrity { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
