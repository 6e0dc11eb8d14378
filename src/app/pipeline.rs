//! The gas-price forecasting pipeline.
//!
//! Keeping this in one place lets the CLI and the integration tests share the
//! core workflow:
//! load -> split -> configure -> fit -> forecast -> evaluate (-> cross-validate)
//!
//! The analysis settings below are fixed on purpose: they are the tuned values
//! of the original study, not knobs.

use std::path::Path;

use chrono::NaiveDate;

use crate::data::{SampleConfig, generate_sample};
use crate::domain::{
    Covariates, DateWindow, Evaluation, Forecast, Series, Split, TrainingFrame, month_start, split_train_test,
};
use crate::error::AppError;
use crate::eval::{CvConfig, CvSummary, cross_validate, evaluate, summarize};
use crate::io::{ModelFile, load_series, parse_month, read_model_json};
use crate::models::{ForecastModel, Growth, ModelBuilder, RegressorSpec, SeasonalitySpec};

/// First month of the test partition.
pub const TEST_START: &str = "2016-01-01";
/// Name of the recession flag column (regressor and seasonality condition).
pub const GREAT_RECESSION: &str = "great_recession";
pub const GREAT_RECESSION_START: &str = "2007-12-01";
pub const GREAT_RECESSION_END: &str = "2009-06-01";
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_UNCERTAINTY_SAMPLES: usize = 1000;
/// Share of cross-validation points averaged per horizon.
pub const CV_ROLLING_WINDOW: f64 = 0.1;

/// Per-run settings that are not part of the model.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub cutoff: NaiveDate,
    pub seed: u64,
    pub uncertainty_samples: usize,
    /// `None` skips cross-validation.
    pub cross_validation: Option<CvConfig>,
}

impl RunConfig {
    pub fn new(cutoff: NaiveDate, seed: u64) -> Self {
        Self {
            cutoff,
            seed,
            uncertainty_samples: DEFAULT_UNCERTAINTY_SAMPLES,
            cross_validation: Some(CvConfig::default()),
        }
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub series: Series,
    pub split: Split,
    pub windows: Vec<DateWindow>,
    pub model: ForecastModel,
    pub fitted: crate::models::FittedModel,
    pub forecast: Forecast,
    pub evaluation: Evaluation,
    pub cv: Option<CvSummary>,
}

/// Parse one of the date constants above (or a CLI value) as a month start.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_month(raw))
        .map(month_start)
        .ok_or_else(|| AppError::config(format!("Invalid date '{raw}' (expected YYYY-MM-DD or YYYY-MM).")))
}

pub fn default_cutoff() -> Result<NaiveDate, AppError> {
    parse_date(TEST_START)
}

/// December 2007 through June 2009, inclusive.
pub fn great_recession_window() -> Result<DateWindow, AppError> {
    DateWindow::new(
        GREAT_RECESSION,
        parse_date(GREAT_RECESSION_START)?,
        parse_date(GREAT_RECESSION_END)?,
    )
}

/// The tuned gas-price model.
///
/// - linear trend, changepoint prior 0.1 over the first 85% of the history
/// - additive yearly seasonality, order 3, prior 20
/// - yearly seasonality of order 4 active only during the Great Recession
/// - the Great Recession flag as an additive regressor
pub fn gas_price_model(uncertainty_samples: usize) -> Result<ForecastModel, AppError> {
    ModelBuilder::new()
        .growth(Growth::Linear)
        .changepoint_prior_scale(0.1)
        .changepoint_range(0.85)
        .add_seasonality(SeasonalitySpec::new("yearly", 365.25, 3).with_prior_scale(20.0))
        .add_seasonality(SeasonalitySpec::new("recession_seasonality", 365.25, 4).conditional_on(GREAT_RECESSION))
        .add_regressor(RegressorSpec::new(GREAT_RECESSION))
        .uncertainty_samples(uncertainty_samples)
        .build()
}

/// Load the CSV at `path` and run the pipeline on it.
pub fn run_pipeline(path: &Path, config: &RunConfig) -> Result<RunOutput, AppError> {
    let series = load_series(path)?;
    run_with_series(series, config)
}

/// Run the pipeline on an already-loaded series.
pub fn run_with_series(series: Series, config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Split.
    let split = split_train_test(&series, config.cutoff)?;

    // 2) Configure.
    let windows = vec![great_recession_window()?];
    let model = gas_price_model(config.uncertainty_samples)?;

    // 3) Fit on the training partition.
    let train = TrainingFrame::from_observations(&split.train, &windows)?;
    let fitted = model.fit(&train)?;

    // 4) Forecast the full train + test horizon.
    let dates = series.dates();
    let covariates = Covariates::from_windows(&windows, &dates)?;
    let forecast = fitted.predict(&dates, &covariates, config.seed)?;

    // 5) Evaluate.
    let evaluation = evaluate(&forecast, &split)?;

    // 6) Optional cross-validation over the training history.
    let cv = match &config.cross_validation {
        Some(cv_config) => {
            let points = cross_validate(&model, &train, cv_config, config.seed)?;
            Some(summarize(points, CV_ROLLING_WINDOW)?)
        }
        None => None,
    };

    Ok(RunOutput {
        series,
        split,
        windows,
        model,
        fitted,
        forecast,
        evaluation,
        cv,
    })
}

/// Forecast `periods` months past the history of a saved model.
pub fn forecast_from_model_file(path: &Path, periods: usize, seed: u64) -> Result<Forecast, AppError> {
    let file: ModelFile = read_model_json(path)?;
    let dates = file.model.future_dates(periods)?;
    let covariates = Covariates::from_windows(&file.windows, &dates)?;
    file.model.predict(&dates, &covariates, seed)
}

/// Synthetic gas-like series with the Great Recession dip.
pub fn synthetic_series(start: NaiveDate, end: NaiveDate, seed: u64) -> Result<Series, AppError> {
    let config = SampleConfig::new(start, end, seed).with_dip(great_recession_window()?);
    generate_sample(&config)
}
