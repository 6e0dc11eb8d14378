//! Data-dependent transforms fixed by the training history.
//!
//! Everything here is recomputed from the stored history, so a saved model
//! never carries a scale that disagrees with its data.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::TrainingFrame;
use crate::error::AppError;
use crate::math::{mean, std_dev};
use crate::models::{ModelConfig, Standardize};

/// Unix seconds at midnight UTC, the timestamp unit of the Prophet backend.
pub fn timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Center/scale applied to one regressor column.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressorScaling {
    pub name: String,
    pub mu: f64,
    pub std: f64,
}

impl RegressorScaling {
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.mu) / self.std
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scaling {
    /// Largest absolute target value of the history (1 if all are zero).
    pub y_scale: f64,
    /// Time origin (`t = 0`).
    pub start: NaiveDate,
    /// Seconds between the first and last history date (`t = 1`).
    pub t_scale: f64,
    pub regressors: Vec<RegressorScaling>,
}

impl Scaling {
    pub fn from_history(config: &ModelConfig, frame: &TrainingFrame) -> Result<Self, AppError> {
        let (Some(&start), Some(&end)) = (frame.dates.first(), frame.dates.last()) else {
            return Err(AppError::fit("Cannot scale an empty history."));
        };
        let t_scale = (timestamp(end) - timestamp(start)) as f64;
        if t_scale <= 0.0 {
            return Err(AppError::fit("History must span more than one date."));
        }

        let y_max = frame.y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_max > 0.0 { y_max } else { 1.0 };

        let regressors = config
            .regressors
            .iter()
            .map(|r| {
                let values = frame.covariates.require(&r.name)?;
                Ok(regressor_scaling(&r.name, values, r.standardize))
            })
            .collect::<Result<_, AppError>>()?;

        Ok(Self {
            y_scale,
            start,
            t_scale,
            regressors,
        })
    }

    /// Scaled time of `date` (0 at the first history date, 1 at the last).
    pub fn t(&self, date: NaiveDate) -> f64 {
        (timestamp(date) - timestamp(self.start)) as f64 / self.t_scale
    }

    pub fn regressor(&self, name: &str) -> Option<&RegressorScaling> {
        self.regressors.iter().find(|r| r.name == name)
    }
}

/// Mean and sample standard deviation, unless the column is binary (under
/// `Auto`), opted out, or has fewer than two distinct values.
fn regressor_scaling(name: &str, values: &[f64], standardize: Standardize) -> RegressorScaling {
    let identity = RegressorScaling {
        name: name.to_string(),
        mu: 0.0,
        std: 1.0,
    };
    let wanted = match standardize {
        Standardize::Yes => true,
        Standardize::No => false,
        Standardize::Auto => !is_binary(values),
    };
    let varies = values.iter().any(|&v| v != values[0]);
    if !wanted || !varies {
        return identity;
    }
    match (mean(values), std_dev(values)) {
        (Some(mu), Some(std)) if std > 0.0 => RegressorScaling {
            name: name.to_string(),
            mu,
            std,
        },
        _ => identity,
    }
}

/// Values restricted to `{0, 1}`.
pub fn is_binary(values: &[f64]) -> bool {
    values.iter().all(|&v| v == 0.0 || v == 1.0)
}
