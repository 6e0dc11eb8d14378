//! Rolling-origin cross-validation (simulated historical forecasts).
//!
//! For each cutoff the model is refit on the history up to and including the
//! cutoff, then asked to forecast the following `horizon`. Cutoffs are spaced
//! `period` apart, walking back from `last date - horizon`, and the first fold
//! always has at least `initial` of history.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::TrainingFrame;
use crate::error::AppError;
use crate::models::ForecastModel;

/// Window sizes in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvConfig {
    pub initial_days: i64,
    pub period_days: i64,
    pub horizon_days: i64,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            initial_days: 730,
            period_days: 180,
            horizon_days: 365,
        }
    }
}

impl CvConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.initial_days < 0 || self.period_days <= 0 || self.horizon_days <= 0 {
            return Err(AppError::config(format!(
                "Cross-validation windows must be positive (initial {}, period {}, horizon {}).",
                self.initial_days, self.period_days, self.horizon_days
            )));
        }
        Ok(())
    }
}

/// One out-of-sample prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvPoint {
    pub date: NaiveDate,
    pub cutoff: NaiveDate,
    pub y: f64,
    pub yhat: f64,
    pub yhat_lower: Option<f64>,
    pub yhat_upper: Option<f64>,
}

impl CvPoint {
    /// Days between the fold cutoff and the predicted date.
    pub fn horizon_days(&self) -> i64 {
        (self.date - self.cutoff).num_days()
    }
}

/// Cutoff dates in ascending order.
pub fn generate_cutoffs(dates: &[NaiveDate], cv: &CvConfig) -> Result<Vec<NaiveDate>, AppError> {
    cv.validate()?;
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return Err(AppError::data("Cannot cross-validate an empty history."));
    };
    let horizon = Duration::days(cv.horizon_days);
    let period = Duration::days(cv.period_days);
    let earliest = first + Duration::days(cv.initial_days);

    let mut cutoff = last - horizon;
    if cutoff < first {
        return Err(AppError::config("History is shorter than the cross-validation horizon."));
    }

    let mut result = vec![cutoff];
    while result.last().is_some_and(|&c| c >= earliest) {
        cutoff -= period;
        let covered = dates.iter().any(|&d| d > cutoff && d <= cutoff + horizon);
        if !covered && cutoff > first {
            // Jump to the last observed date before this cutoff.
            if let Some(&closest) = dates.iter().rev().find(|&&d| d <= cutoff) {
                cutoff = closest - horizon;
            }
        }
        result.push(cutoff);
    }
    result.pop();

    if result.is_empty() {
        return Err(AppError::config(
            "Less data than horizon after the initial window; shorten the horizon or initial window.",
        ));
    }
    result.reverse();
    Ok(result)
}

/// Fit one model per cutoff and collect its out-of-sample predictions.
///
/// Folds run in parallel; output is ordered by cutoff, then date.
pub fn cross_validate(
    model: &ForecastModel,
    frame: &TrainingFrame,
    cv: &CvConfig,
    seed: u64,
) -> Result<Vec<CvPoint>, AppError> {
    let cutoffs = generate_cutoffs(&frame.dates, cv)?;
    let horizon = Duration::days(cv.horizon_days);
    tracing::info!(folds = cutoffs.len(), "cross-validation started");

    let folds: Vec<Vec<CvPoint>> = cutoffs
        .par_iter()
        .enumerate()
        .map(|(fold, &cutoff)| {
            let train_end = frame.dates.partition_point(|&d| d <= cutoff);
            let test_end = frame.dates.partition_point(|&d| d <= cutoff + horizon);
            if train_end < 2 {
                return Err(AppError::fit(format!(
                    "Fewer than two observations before cutoff {cutoff}; increase the initial window."
                )));
            }

            let history = frame.slice(0..train_end);
            let target = frame.slice(train_end..test_end);
            let fitted = model.fit(&history)?;
            let forecast = fitted.predict(&target.dates, &target.covariates, seed.wrapping_add(fold as u64))?;

            tracing::debug!(%cutoff, train = history.len(), test = target.len(), "fold done");
            Ok(forecast
                .points
                .iter()
                .zip(target.y.iter())
                .map(|(p, &y)| CvPoint {
                    date: p.date,
                    cutoff,
                    y,
                    yhat: p.yhat,
                    yhat_lower: p.yhat_lower,
                    yhat_upper: p.yhat_upper,
                })
                .collect::<Vec<_>>())
        })
        .collect::<Result<_, AppError>>()?;

    Ok(folds.into_iter().flatten().collect())
}
