//! Unfit and fitted forecasting models.
//!
//! `ForecastModel` is a validated configuration; `fit` hands it and a
//! `TrainingFrame` to the Prophet backend and keeps what the optimizer
//! estimated. A `FittedModel` is plain data (configuration, history, estimate)
//! and can be restored into a working backend model at any time, including
//! after a JSON round trip.

use augurs_prophet::Prophet;
use augurs_prophet::optimizer::OptimizeOpts;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{Covariates, Forecast, TrainingFrame};
use crate::error::AppError;
use crate::fit::{FitRecord, MapParams, ReplayOptimizer, StanOptimizer, build_prophet, training_data};
use crate::forecast;
use crate::models::{ModelConfig, Scaling};

/// Pinned so refitting the same history gives the same estimate.
const STAN_SEED: u32 = 0;

/// A configured, not yet fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastModel {
    config: ModelConfig,
}

impl ForecastModel {
    pub fn new(config: ModelConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit the model to a training history.
    pub fn fit(&self, frame: &TrainingFrame) -> Result<FittedModel, AppError> {
        check_history(&self.config, frame)?;
        let scaling = Scaling::from_history(&self.config, frame)?;

        let optimizer = StanOptimizer::new();
        let mut prophet = build_prophet(&self.config, frame.len(), optimizer.clone())?;
        let opts = OptimizeOpts {
            seed: Some(STAN_SEED),
            iter: u32::try_from(self.config.max_iterations).ok(),
            ..OptimizeOpts::default()
        };
        prophet.fit(training_data(&self.config, &scaling, frame)?, opts)?;
        let record = optimizer
            .take_record()
            .ok_or_else(|| AppError::fit("The optimizer finished without an estimate."))?;

        tracing::info!(
            rows = frame.len(),
            changepoints = record.params.delta.len(),
            coefficients = record.params.beta.len(),
            sigma_obs = record.params.sigma_obs * scaling.y_scale,
            "model fitted"
        );

        Ok(FittedModel {
            config: self.config.clone(),
            history: frame.clone(),
            fit: record,
        })
    }
}

/// Checks shared by fitting and restoring.
fn check_history(config: &ModelConfig, frame: &TrainingFrame) -> Result<(), AppError> {
    let n = frame.len();
    if n < 2 {
        return Err(AppError::fit(format!(
            "At least 2 training observations are required, got {n}."
        )));
    }
    if let Some(i) = frame.dates.windows(2).position(|w| w[0] >= w[1]) {
        return Err(AppError::data(format!(
            "Training dates must be strictly increasing ({} then {}).",
            frame.dates[i],
            frame.dates[i + 1]
        )));
    }
    if frame.y.iter().any(|v| !v.is_finite()) {
        return Err(AppError::data("Training values must be finite."));
    }
    for name in config.required_columns() {
        frame.covariates.require(&name)?;
    }
    Ok(())
}

/// Everything learned from one fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub config: ModelConfig,
    /// The rows the estimate was fitted on.
    pub history: TrainingFrame,
    pub fit: FitRecord,
}

/// A fitted model rebuilt on the backend, ready to predict.
#[derive(Debug)]
pub struct RestoredModel<'a> {
    pub fitted: &'a FittedModel,
    pub prophet: Prophet<ReplayOptimizer>,
    pub scaling: Scaling,
}

impl FittedModel {
    pub fn params(&self) -> &MapParams {
        &self.fit.params
    }

    pub fn history_start(&self) -> Option<NaiveDate> {
        self.history.dates.first().copied()
    }

    pub fn history_end(&self) -> Option<NaiveDate> {
        self.history.dates.last().copied()
    }

    pub fn scaling(&self) -> Result<Scaling, AppError> {
        Scaling::from_history(&self.config, &self.history)
    }

    /// History dates where the trend may bend.
    pub fn changepoints(&self) -> Vec<NaiveDate> {
        let Ok(scaling) = self.scaling() else {
            return Vec::new();
        };
        // The backend stores a single `t = 0` placeholder when there are none.
        self.history
            .dates
            .iter()
            .copied()
            .filter(|&d| {
                let t = scaling.t(d);
                t > 0.0 && self.fit.changepoints_t.iter().any(|&c| (c - t).abs() < 1e-9)
            })
            .collect()
    }

    /// Rebuild the backend model from the stored history and estimate.
    ///
    /// Fails with a data error when the estimate does not fit the shape the
    /// configuration implies (for example an edited Fourier order).
    pub fn restore(&self) -> Result<RestoredModel<'_>, AppError> {
        self.config.validate()?;
        check_history(&self.config, &self.history)?;
        let scaling = Scaling::from_history(&self.config, &self.history)?;

        let mut prophet = build_prophet(
            &self.config,
            self.history.len(),
            ReplayOptimizer::new(self.fit.clone()),
        )?;
        prophet
            .fit(training_data(&self.config, &scaling, &self.history)?, OptimizeOpts::default())
            .map_err(|e| match e {
                augurs_prophet::Error::OptimizationFailed(msg) => {
                    AppError::data(format!("Stored estimate does not match the model: {msg}"))
                }
                other => AppError::from(other),
            })?;

        Ok(RestoredModel {
            fitted: self,
            prophet,
            scaling,
        })
    }

    /// Forecast the given dates; `covariates` must be aligned with `dates`.
    ///
    /// With `uncertainty_samples > 0` the result carries prediction intervals,
    /// reproducible for a given `seed`.
    pub fn predict(&self, dates: &[NaiveDate], covariates: &Covariates, seed: u64) -> Result<Forecast, AppError> {
        forecast::predict(self, dates, covariates, seed)
    }

    /// The `periods` month starts following the end of the history.
    pub fn future_dates(&self, periods: usize) -> Result<Vec<NaiveDate>, AppError> {
        let end = self
            .history_end()
            .ok_or_else(|| AppError::data("Model has an empty history."))?;
        (1..=periods)
            .map(|i| {
                u32::try_from(i)
                    .ok()
                    .and_then(|m| end.checked_add_months(Months::new(m)))
                    .ok_or_else(|| AppError::config(format!("Cannot extend the history by {i} months.")))
            })
            .collect()
    }
}
