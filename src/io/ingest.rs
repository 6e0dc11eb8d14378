//! CSV ingest and validation.
//!
//! Turns a two-column `date,price` CSV into a `Series`:
//! - **Strict**: the first bad row fails the whole load, naming its line
//! - **Order-preserving**: rows are never sorted or deduplicated silently
//! - **Lenient on layout**: header names are free, extra columns are ignored

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{Observation, Series, month_start};
use crate::error::AppError;

/// Accepted date layouts (after stripping a trailing midnight time).
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Load a monthly price series from a CSV file.
pub fn load_series(path: &Path) -> Result<Series, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::data(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let series = read_series(file)?;
    tracing::info!(
        path = %path.display(),
        rows = series.len(),
        first = ?series.first_date(),
        last = ?series.last_date(),
        "series loaded"
    );
    Ok(series)
}

/// Parse a monthly price series from any CSV reader.
pub fn read_series<R: Read>(reader: R) -> Result<Series, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data(format!("Failed to read CSV header: {e}")))?
        .clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim_start_matches('\u{feff}').is_empty()) {
        return Err(AppError::data("CSV header is missing."));
    }
    if headers.len() < 2 {
        return Err(AppError::data(format!(
            "CSV needs a date and a price column, header has {} column(s).",
            headers.len()
        )));
    }

    let mut observations: Vec<Observation> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::data(format!("Line {line}: CSV parse error: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let obs = parse_row(&record, line)?;

        if let Some(prev) = observations.last() {
            if obs.date == prev.date {
                return Err(AppError::data(format!("Line {line}: duplicate month {}.", obs.date)));
            }
            if obs.date < prev.date {
                return Err(AppError::data(format!(
                    "Line {line}: dates are not increasing ({} after {}).",
                    obs.date, prev.date
                )));
            }
        }
        observations.push(obs);
    }

    if observations.is_empty() {
        return Err(AppError::data("CSV has no data rows."));
    }
    Series::new(observations)
}

fn parse_row(record: &StringRecord, line: usize) -> Result<Observation, AppError> {
    let raw_date = record.get(0).unwrap_or_default();
    let raw_price = record.get(1).unwrap_or_default();

    let date = parse_month(raw_date)
        .ok_or_else(|| AppError::data(format!("Line {line}: unparsable date '{raw_date}'.")))?;

    if raw_price.is_empty() {
        return Err(AppError::data(format!("Line {line}: missing price.")));
    }
    let price: f64 = raw_price
        .parse()
        .map_err(|_| AppError::data(format!("Line {line}: non-numeric price '{raw_price}'.")))?;
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::data(format!(
            "Line {line}: price must be finite and non-negative, got {raw_price}."
        )));
    }

    Ok(Observation { date, price })
}

/// Parse a date cell and normalize it to the first of its month.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_start_matches('\u{feff}');
    let s = s
        .strip_suffix(" 00:00:00")
        .or_else(|| s.strip_suffix("T00:00:00"))
        .unwrap_or(s);

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(month_start(d));
        }
    }
    // Month-level: `YYYY-MM`.
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()
}
