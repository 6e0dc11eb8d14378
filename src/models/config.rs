//! Model configuration and validation.
//!
//! `ModelBuilder` collects trend, seasonality, regressor and optimizer settings;
//! `build()` validates them and returns an unfit [`ForecastModel`]. Nothing here
//! touches data: every check is on the configuration alone.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::ForecastModel;

/// Column/component names that are reserved for forecast outputs.
const RESERVED_NAMES: [&str; 6] = ["trend", "yhat", "additive_terms", "multiplicative_terms", "ds", "y"];

/// Trend shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Growth {
    /// Piecewise-linear trend with changepoints.
    Linear,
    /// Constant level.
    Flat,
}

/// How a component combines with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    /// `y = trend + component`
    Additive,
    /// `y = trend * (1 + component)`
    Multiplicative,
}

/// Whether a regressor column is centered and scaled before fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standardize {
    /// Standardize unless the column only holds 0/1 values.
    Auto,
    Yes,
    No,
}

/// A periodic component modeled with a truncated Fourier series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalitySpec {
    pub name: String,
    /// Period in days.
    pub period: f64,
    pub fourier_order: usize,
    /// `None` inherits the model's `seasonality_prior_scale`.
    pub prior_scale: Option<f64>,
    pub mode: SeasonalityMode,
    /// Name of a 0/1 covariate; the component is active only where it is 1.
    pub condition: Option<String>,
}

impl SeasonalitySpec {
    pub fn new(name: impl Into<String>, period: f64, fourier_order: usize) -> Self {
        Self {
            name: name.into(),
            period,
            fourier_order,
            prior_scale: None,
            mode: SeasonalityMode::Additive,
            condition: None,
        }
    }

    pub fn with_prior_scale(mut self, scale: f64) -> Self {
        self.prior_scale = Some(scale);
        self
    }

    pub fn with_mode(mut self, mode: SeasonalityMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn conditional_on(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// An extra explanatory column supplied alongside the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorSpec {
    pub name: String,
    pub prior_scale: Option<f64>,
    pub mode: SeasonalityMode,
    pub standardize: Standardize,
}

impl RegressorSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prior_scale: None,
            mode: SeasonalityMode::Additive,
            standardize: Standardize::Auto,
        }
    }

    pub fn with_prior_scale(mut self, scale: f64) -> Self {
        self.prior_scale = Some(scale);
        self
    }

    pub fn with_mode(mut self, mode: SeasonalityMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_standardize(mut self, standardize: Standardize) -> Self {
        self.standardize = standardize;
        self
    }
}

/// Validated model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub growth: Growth,
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Scale of the Laplace prior on trend slope changes.
    pub changepoint_prior_scale: f64,
    /// Default prior scale for seasonalities and regressors.
    pub seasonality_prior_scale: f64,
    pub seasonalities: Vec<SeasonalitySpec>,
    pub regressors: Vec<RegressorSpec>,
    pub interval_width: f64,
    /// Simulated paths for intervals; `0` disables them.
    pub uncertainty_samples: usize,
    /// Iteration cap handed to the Stan optimizer.
    pub max_iterations: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            growth: Growth::Linear,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            seasonalities: Vec::new(),
            regressors: Vec::new(),
            interval_width: 0.8,
            uncertainty_samples: 1000,
            max_iterations: 10_000,
        }
    }
}

impl ModelConfig {
    /// Effective prior scale of a seasonality.
    pub fn seasonality_prior(&self, s: &SeasonalitySpec) -> f64 {
        s.prior_scale.unwrap_or(self.seasonality_prior_scale)
    }

    /// Effective prior scale of a regressor.
    pub fn regressor_prior(&self, r: &RegressorSpec) -> f64 {
        r.prior_scale.unwrap_or(self.seasonality_prior_scale)
    }

    /// Names of all covariate columns the model reads (conditions + regressors).
    pub fn required_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let conditions = self.seasonalities.iter().filter_map(|s| s.condition.clone());
        let regressors = self.regressors.iter().map(|r| r.name.clone());
        for name in conditions.chain(regressors) {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(AppError::config(format!(
                "changepoint_range must be in (0, 1], got {}.",
                self.changepoint_range
            )));
        }
        check_scale("changepoint_prior_scale", self.changepoint_prior_scale)?;
        check_scale("seasonality_prior_scale", self.seasonality_prior_scale)?;
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(AppError::config(format!(
                "interval_width must be in (0, 1), got {}.",
                self.interval_width
            )));
        }
        if self.max_iterations == 0 || u32::try_from(self.max_iterations).is_err() {
            return Err(AppError::config(format!(
                "max_iterations must be in 1..={}, got {}.",
                u32::MAX,
                self.max_iterations
            )));
        }

        let mut names = HashSet::new();
        for s in &self.seasonalities {
            check_name(&s.name, &mut names)?;
            if !(s.period.is_finite() && s.period > 0.0) {
                return Err(AppError::config(format!(
                    "Seasonality `{}` needs a positive period, got {}.",
                    s.name, s.period
                )));
            }
            if s.fourier_order == 0 {
                return Err(AppError::config(format!(
                    "Seasonality `{}` needs fourier_order >= 1.",
                    s.name
                )));
            }
            if let Some(scale) = s.prior_scale {
                check_scale(&format!("prior_scale of `{}`", s.name), scale)?;
            }
            if let Some(cond) = &s.condition {
                if cond.trim().is_empty() {
                    return Err(AppError::config(format!(
                        "Seasonality `{}` has an empty condition name.",
                        s.name
                    )));
                }
            }
        }
        for r in &self.regressors {
            check_name(&r.name, &mut names)?;
            if let Some(scale) = r.prior_scale {
                check_scale(&format!("prior_scale of `{}`", r.name), scale)?;
            }
        }
        Ok(())
    }
}

fn check_scale(what: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AppError::config(format!("{what} must be finite and > 0, got {value}.")))
    }
}

fn check_name(name: &str, seen: &mut HashSet<String>) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::config("Component names must not be empty."));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(AppError::config(format!("Component name `{name}` is reserved.")));
    }
    if !seen.insert(name.to_string()) {
        return Err(AppError::config(format!("Component name `{name}` is used twice.")));
    }
    Ok(())
}

/// Fluent configurator for [`ForecastModel`].
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    config: ModelConfig,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn growth(mut self, growth: Growth) -> Self {
        self.config.growth = growth;
        self
    }

    pub fn n_changepoints(mut self, n: usize) -> Self {
        self.config.n_changepoints = n;
        self
    }

    pub fn changepoint_range(mut self, range: f64) -> Self {
        self.config.changepoint_range = range;
        self
    }

    pub fn changepoint_prior_scale(mut self, scale: f64) -> Self {
        self.config.changepoint_prior_scale = scale;
        self
    }

    pub fn seasonality_prior_scale(mut self, scale: f64) -> Self {
        self.config.seasonality_prior_scale = scale;
        self
    }

    pub fn add_seasonality(mut self, seasonality: SeasonalitySpec) -> Self {
        self.config.seasonalities.push(seasonality);
        self
    }

    pub fn add_regressor(mut self, regressor: RegressorSpec) -> Self {
        self.config.regressors.push(regressor);
        self
    }

    pub fn interval_width(mut self, width: f64) -> Self {
        self.config.interval_width = width;
        self
    }

    pub fn uncertainty_samples(mut self, n: usize) -> Self {
        self.config.uncertainty_samples = n;
        self
    }

    pub fn max_iterations(mut self, n: usize) -> Self {
        self.config.max_iterations = n;
        self
    }

    pub fn build(self) -> Result<ForecastModel, AppError> {
        ForecastModel::new(self.config)
    }
}
