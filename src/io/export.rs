//! CSV exports.
//!
//! - forecasts: one row per forecast date, joined with the observed price and
//!   the partition it belongs to, so the file can be charted or diffed directly
//! - series: the plain `date,price` layout `ingest` reads back

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Forecast, Series, Split};
use crate::error::{AppError, Partition};

#[derive(Debug, Serialize)]
struct ForecastRow {
    date: NaiveDate,
    actual: Option<f64>,
    yhat: f64,
    yhat_lower: Option<f64>,
    yhat_upper: Option<f64>,
    trend: f64,
    partition: Option<Partition>,
}

/// Write `forecast` to `path`; dates without an observation get empty cells.
pub fn write_forecast_csv(path: &Path, forecast: &Forecast, split: Option<&Split>) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for p in &forecast.points {
        let observed = split.and_then(|s| lookup(s, p.date));
        let row = ForecastRow {
            date: p.date,
            actual: observed.map(|o| o.0),
            yhat: p.yhat,
            yhat_lower: p.yhat_lower,
            yhat_upper: p.yhat_upper,
            trend: p.trend,
            partition: observed.map(|o| o.1),
        };
        writer
            .serialize(&row)
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?;
    tracing::info!(path = %path.display(), rows = forecast.len(), "forecast exported");
    Ok(())
}

#[derive(Debug, Serialize)]
struct SeriesRow {
    date: NaiveDate,
    price: f64,
}

/// Write `series` as a `date,price` CSV.
pub fn write_series_csv(path: &Path, series: &Series) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create series CSV '{}': {e}", path.display())))?;
    for o in series.observations() {
        writer
            .serialize(SeriesRow {
                date: o.date,
                price: o.price,
            })
            .map_err(|e| AppError::io(format!("Failed to write series CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush series CSV: {e}")))?;
    tracing::info!(path = %path.display(), rows = series.len(), "series written");
    Ok(())
}

fn lookup(split: &Split, date: NaiveDate) -> Option<(f64, Partition)> {
    [Partition::Train, Partition::Test].into_iter().find_map(|which| {
        let obs = split.partition(which);
        obs.binary_search_by(|o| o.date.cmp(&date))
            .ok()
            .map(|i| (obs[i].price, which))
    })
}
