//! Error type shared by every pipeline stage.
//!
//! Each variant maps to a process exit code so `main` can surface failures the
//! same way regardless of which stage produced them:
//!
//! - `2`: bad input data, bad configuration, file I/O
//! - `3`: a metric was requested for an empty partition
//! - `4`: the model could not be fitted

use std::fmt;

use thiserror::Error;

/// Which side of the train/test split a metric refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Train,
    Test,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Train => write!(f, "train"),
            Partition::Test => write!(f, "test"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Malformed or missing input (CSV contents, misaligned covariates).
    #[error("data error: {0}")]
    Data(String),

    /// Invalid split cutoff, hyperparameters or CLI values.
    #[error("config error: {0}")]
    Config(String),

    /// Insufficient history or an optimizer failure.
    #[error("fit error: {0}")]
    Fit(String),

    /// MAE/RMSE are undefined over zero observations.
    #[error("metrics are undefined for the empty {0} partition")]
    EmptyPartition(Partition),

    /// Failures writing exports or reading saved models.
    #[error("i/o error: {0}")]
    Io(String),
}

impl AppError {
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn fit(message: impl Into<String>) -> Self {
        Self::Fit(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Data(_) | AppError::Config(_) | AppError::Io(_) => 2,
            AppError::EmptyPartition(_) => 3,
            AppError::Fit(_) => 4,
        }
    }
}

impl From<augurs_prophet::Error> for AppError {
    fn from(err: augurs_prophet::Error) -> Self {
        use augurs_prophet::Error as E;
        match err {
            E::MismatchedLengths { .. }
            | E::NaNValue { .. }
            | E::InfiniteValue { .. }
            | E::MissingRegressor(_)
            | E::MissingSeasonalityCondition(_)
            | E::TimestampsAreConstant(_)
            | E::TooManyDataPoints(_) => AppError::data(err.to_string()),
            E::InvalidIntervalWidth(_) | E::DuplicateSeasonality(_) => AppError::config(err.to_string()),
            other => AppError::fit(other.to_string()),
        }
    }
}
