//! Build `augurs_prophet` models and data frames from a `ModelConfig`.
//!
//! Built-in yearly/weekly/daily seasonalities are switched off: every
//! component the model uses is declared explicitly in the configuration.
//! Regressors arrive already standardized (see `models::scaling`), so the
//! backend is told not to standardize them again.

use std::collections::HashMap;
use std::num::NonZeroU32;

use augurs_prophet::{
    FeatureMode, GrowthType, IntervalWidth, PositiveFloat, PredictionData, Prophet, ProphetOptions, Regressor,
    Seasonality, SeasonalityOption, TrainingData,
};
use chrono::NaiveDate;

use crate::domain::{Covariates, TrainingFrame};
use crate::error::AppError;
use crate::models::{Growth, ModelConfig, Scaling, SeasonalityMode, is_binary, timestamp};

fn positive(what: &str, value: f64) -> Result<PositiveFloat, AppError> {
    PositiveFloat::try_new(value).map_err(|_| AppError::config(format!("{what} must be finite and > 0, got {value}.")))
}

fn feature_mode(mode: SeasonalityMode) -> FeatureMode {
    match mode {
        SeasonalityMode::Additive => FeatureMode::Additive,
        SeasonalityMode::Multiplicative => FeatureMode::Multiplicative,
    }
}

/// Backend options for a history of `history_len` rows.
pub fn prophet_options(config: &ModelConfig, history_len: usize) -> Result<ProphetOptions, AppError> {
    let n_changepoints = u32::try_from(config.n_changepoints)
        .map_err(|_| AppError::config(format!("Too many changepoints: {}.", config.n_changepoints)))?;
    // With no eligible row the backend cannot place changepoints itself.
    let eligible = (history_len as f64 * config.changepoint_range).floor() as usize;

    Ok(ProphetOptions {
        growth: match config.growth {
            Growth::Linear => GrowthType::Linear,
            Growth::Flat => GrowthType::Flat,
        },
        changepoints: (eligible == 0).then(Vec::new),
        n_changepoints,
        changepoint_range: positive("changepoint_range", config.changepoint_range)?,
        yearly_seasonality: SeasonalityOption::Manual(false),
        weekly_seasonality: SeasonalityOption::Manual(false),
        daily_seasonality: SeasonalityOption::Manual(false),
        seasonality_prior_scale: positive("seasonality_prior_scale", config.seasonality_prior_scale)?,
        changepoint_prior_scale: positive("changepoint_prior_scale", config.changepoint_prior_scale)?,
        interval_width: IntervalWidth::try_new(config.interval_width)?,
        // Intervals are simulated on our side so they can be seeded.
        uncertainty_samples: 0,
        ..ProphetOptions::default()
    })
}

/// An unfit backend model with every configured seasonality and regressor.
pub fn build_prophet<O>(config: &ModelConfig, history_len: usize, optimizer: O) -> Result<Prophet<O>, AppError> {
    let mut prophet = Prophet::new(prophet_options(config, history_len)?, optimizer);

    for s in &config.seasonalities {
        let order = u32::try_from(s.fourier_order)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| AppError::config(format!("Seasonality `{}` has an invalid fourier_order.", s.name)))?;
        let mut seasonality = Seasonality::new(positive(&format!("period of `{}`", s.name), s.period)?, order)
            .with_prior_scale(positive(&format!("prior_scale of `{}`", s.name), config.seasonality_prior(s))?)
            .with_mode(feature_mode(s.mode));
        if let Some(condition) = &s.condition {
            seasonality = seasonality.with_condition(condition.clone());
        }
        prophet.add_seasonality(s.name.clone(), seasonality)?;
    }

    for r in &config.regressors {
        let regressor = match r.mode {
            SeasonalityMode::Additive => Regressor::additive(),
            SeasonalityMode::Multiplicative => Regressor::multiplicative(),
        }
        .with_prior_scale(positive(&format!("prior_scale of `{}`", r.name), config.regressor_prior(r))?)
        .with_standardize(augurs_prophet::Standardize::No);
        prophet.add_regressor(r.name.clone(), regressor);
    }

    Ok(prophet)
}

/// One boolean column per distinct seasonality condition.
fn conditions(config: &ModelConfig, covariates: &Covariates) -> Result<HashMap<String, Vec<bool>>, AppError> {
    let mut out = HashMap::new();
    for name in config.seasonalities.iter().filter_map(|s| s.condition.as_ref()) {
        let values = covariates.require(name)?;
        if !is_binary(values) {
            return Err(AppError::data(format!(
                "Condition column `{name}` must only contain 0/1 values."
            )));
        }
        out.insert(name.clone(), values.iter().map(|&v| v == 1.0).collect());
    }
    Ok(out)
}

/// Standardized regressor columns.
fn regressors(
    config: &ModelConfig,
    scaling: &Scaling,
    covariates: &Covariates,
) -> Result<HashMap<String, Vec<f64>>, AppError> {
    let mut out = HashMap::new();
    for r in &config.regressors {
        let values = covariates.require(&r.name)?;
        let sc = scaling
            .regressor(&r.name)
            .ok_or_else(|| AppError::fit(format!("No scaling recorded for regressor `{}`.", r.name)))?;
        out.insert(r.name.clone(), values.iter().map(|&v| sc.apply(v)).collect());
    }
    Ok(out)
}

pub fn training_data(config: &ModelConfig, scaling: &Scaling, frame: &TrainingFrame) -> Result<TrainingData, AppError> {
    let ds = frame.dates.iter().map(|&d| timestamp(d)).collect();
    Ok(TrainingData::new(ds, frame.y.clone())?
        .with_seasonality_conditions(conditions(config, &frame.covariates)?)?
        .with_regressors(regressors(config, scaling, &frame.covariates)?)?)
}

/// Backend input for forecasting `dates`; `covariates` must be aligned with them.
pub fn prediction_data(
    config: &ModelConfig,
    scaling: &Scaling,
    dates: &[NaiveDate],
    covariates: &Covariates,
) -> Result<PredictionData, AppError> {
    if covariates.len() != dates.len() {
        return Err(AppError::data(format!(
            "Covariates have {} rows but {} dates were given.",
            covariates.len(),
            dates.len()
        )));
    }
    let ds = dates.iter().map(|&d| timestamp(d)).collect();
    Ok(PredictionData::new(ds)
        .with_seasonality_conditions(conditions(config, covariates)?)?
        .with_regressors(regressors(config, scaling, covariates)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DateWindow;
    use crate::models::{ModelBuilder, RegressorSpec, SeasonalitySpec};

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn config() -> ModelConfig {
        ModelBuilder::new()
            .changepoint_range(0.85)
            .add_seasonality(SeasonalitySpec::new("yearly", 365.25, 3).with_prior_scale(20.0))
            .add_seasonality(SeasonalitySpec::new("flag_season", 365.25, 2).conditional_on("flag"))
            .add_regressor(RegressorSpec::new("flag"))
            .build()
            .unwrap()
            .config()
            .clone()
    }

    fn frame() -> TrainingFrame {
        let dates: Vec<NaiveDate> = (1..=12).map(|m| d(2008, m)).collect();
        let window = DateWindow::new("flag", d(2008, 3), d(2008, 5)).unwrap();
        let cov = Covariates::from_windows(&[window], &dates).unwrap();
        let y = (0..12).map(|i| 2.0 + 0.1 * i as f64).collect();
        TrainingFrame::new(dates, y, cov).unwrap()
    }

    #[test]
    fn options_disable_builtin_seasonalities() {
        let opts = prophet_options(&config(), 288).unwrap();
        assert!(matches!(opts.yearly_seasonality, SeasonalityOption::Manual(false)));
        assert!(matches!(opts.weekly_seasonality, SeasonalityOption::Manual(false)));
        assert!(matches!(opts.daily_seasonality, SeasonalityOption::Manual(false)));
        assert_eq!(opts.uncertainty_samples, 0);
        assert_eq!(*opts.changepoint_range, 0.85);
        assert!(opts.changepoints.is_none());
    }

    #[test]
    fn tiny_history_gets_no_changepoints() {
        let opts = prophet_options(&config(), 1).unwrap();
        assert_eq!(opts.changepoints, Some(Vec::new()));
    }

    #[test]
    fn conditions_follow_the_window() {
        let cond = conditions(&config(), &frame().covariates).unwrap();
        let flags = &cond["flag"];
        assert_eq!(flags.iter().filter(|f| **f).count(), 3);
        assert!(flags[2] && !flags[5]);
    }

    #[test]
    fn non_binary_condition_is_rejected() {
        let mut cov = Covariates::new(12);
        cov.insert("flag", vec![0.5; 12]).unwrap();
        assert!(matches!(conditions(&config(), &cov), Err(AppError::Data(_))));
    }

    #[test]
    fn prediction_needs_aligned_covariates() {
        let cfg = config();
        let fr = frame();
        let scaling = Scaling::from_history(&cfg, &fr).unwrap();
        let err = prediction_data(&cfg, &scaling, &fr.dates[..3], &fr.covariates).unwrap_err();
        assert!(matches!(err, AppError::Data(_)));
        assert!(prediction_data(&cfg, &scaling, &fr.dates, &fr.covariates).is_ok());
    }

    #[test]
    fn missing_future_covariate_is_data_error() {
        let cfg = config();
        let fr = frame();
        let scaling = Scaling::from_history(&cfg, &fr).unwrap();
        let err = prediction_data(&cfg, &scaling, &[d(2009, 1)], &Covariates::new(1)).unwrap_err();
        assert!(matches!(err, AppError::Data(_)));
    }
}
