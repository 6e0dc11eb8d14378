//! Command-line parsing for the gas-price forecaster.
//!
//! Argument parsing and command dispatch stay separate from the modeling code;
//! the handlers live in `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Default location of the monthly price CSV.
pub const DEFAULT_DATA_PATH: &str = "data/forecasting_take_home_data.csv";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gasfc", version, about = "Monthly gasoline price forecaster")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit on the training months, forecast the full range and report MAE/RMSE.
    Run(RunArgs),
    /// Forecast future months from a model saved with `run --export-model`.
    Forecast(ForecastArgs),
    /// Write a synthetic gas-like price CSV.
    Sample(SampleArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Monthly price CSV (header, then `date,price` rows).
    #[arg(long, env = "GAS_FORECAST_DATA", default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// First month of the test partition.
    #[arg(long, default_value = crate::app::pipeline::TEST_START, value_parser = parse_date_arg)]
    pub cutoff: NaiveDate,

    /// Seed for the uncertainty simulation.
    #[arg(long, default_value_t = crate::app::pipeline::DEFAULT_SEED)]
    pub seed: u64,

    /// Skip cross-validation over the training history.
    #[arg(long)]
    pub no_cv: bool,

    /// Render an ASCII plot of observed vs forecast prices.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Horizon rows to print from the cross-validation table.
    #[arg(long, default_value_t = 12)]
    pub cv_rows: usize,

    /// Export the forecast (with actuals and partition) to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Save the fitted model to JSON.
    #[arg(long = "export-model")]
    pub export_model: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ForecastArgs {
    /// Model JSON produced by `gasfc run --export-model`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// Months to forecast past the end of the training history.
    #[arg(long, default_value_t = 24)]
    pub periods: usize,

    #[arg(long, default_value_t = crate::app::pipeline::DEFAULT_SEED)]
    pub seed: u64,

    /// Write the forecast to CSV instead of only printing it.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, default_value_t = crate::app::pipeline::DEFAULT_SEED)]
    pub seed: u64,

    /// First month (YYYY-MM).
    #[arg(long, default_value = "1992-01", value_parser = parse_date_arg)]
    pub start: NaiveDate,

    /// Last month, inclusive (YYYY-MM).
    #[arg(long, default_value = "2018-01", value_parser = parse_date_arg)]
    pub end: NaiveDate,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    crate::app::pipeline::parse_date(raw).map_err(|e| e.to_string())
}
