//! Read/write fitted-model JSON files.
//!
//! A model file is the portable form of a fit:
//! - the `FittedModel` (configuration, training history, optimizer estimate)
//! - the date windows that rebuild its covariate columns for new dates
//! - a little provenance for humans reading the file
//!
//! Reading restores the model on the backend once, so a file whose estimate
//! no longer matches its configuration is rejected up front.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::DateWindow;
use crate::error::AppError;
use crate::models::FittedModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub version: String,
    pub model: FittedModel,
    pub windows: Vec<DateWindow>,
}

impl ModelFile {
    pub fn new(model: FittedModel, windows: Vec<DateWindow>) -> Self {
        Self {
            tool: "gasfc".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model,
            windows,
        }
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, file: &ModelFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create model JSON '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut writer, file)
        .map_err(|e| AppError::io(format!("Failed to write model JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write model JSON '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), "model exported");
    Ok(())
}

/// Read a model JSON file and check that it still describes a usable model.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let input = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let file: ModelFile = serde_json::from_reader(BufReader::new(input))
        .map_err(|e| AppError::data(format!("Invalid model JSON: {e}")))?;

    file.model.config.validate()?;
    file.model.restore()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Covariates, TrainingFrame};
    use crate::models::{ModelBuilder, RegressorSpec, SeasonalitySpec};
    use chrono::{Months, NaiveDate};

    fn month(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2005, 1, 1)
            .unwrap()
            .checked_add_months(Months::new(i as u32))
            .unwrap()
    }

    fn fitted_file() -> ModelFile {
        let dates: Vec<NaiveDate> = (0..48).map(month).collect();
        let window = DateWindow::new("dip", month(20), month(26)).unwrap();
        let covariates = Covariates::from_windows(std::slice::from_ref(&window), &dates).unwrap();
        let y = (0..48).map(|i| 2.0 + 0.01 * i as f64 + 0.1 * (i as f64).sin()).collect();
        let frame = TrainingFrame::new(dates, y, covariates).unwrap();
        let fitted = ModelBuilder::new()
            .add_seasonality(SeasonalitySpec::new("yearly", 365.25, 2))
            .add_regressor(RegressorSpec::new("dip"))
            .uncertainty_samples(0)
            .build()
            .unwrap()
            .fit(&frame)
            .unwrap();
        ModelFile::new(fitted, vec![window])
    }

    #[test]
    fn round_trip_preserves_forecast() {
        let file = fitted_file();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        write_model_json(&path, &file).unwrap();
        let back = read_model_json(&path).unwrap();
        assert_eq!(back.windows, file.windows);
        assert_eq!(back.model.changepoints(), file.model.changepoints());

        let dates = back.model.future_dates(6).unwrap();
        let cov = Covariates::from_windows(&back.windows, &dates).unwrap();
        let a = file.model.predict(&dates, &cov, 3).unwrap();
        let b = back.model.predict(&dates, &cov, 3).unwrap();
        for (p, q) in a.points.iter().zip(b.points.iter()) {
            assert!((p.yhat - q.yhat).abs() < 1e-9);
        }
    }

    #[test]
    fn edited_fourier_order_is_data_error() {
        let mut file = fitted_file();
        file.model.config.seasonalities[0].fourier_order = 4;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edited.json");
        write_model_json(&path, &file).unwrap();
        assert!(matches!(read_model_json(&path), Err(AppError::Data(_))));
    }

    #[test]
    fn truncated_estimate_is_data_error() {
        let mut file = fitted_file();
        file.model.fit.params.delta.pop();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.json");
        write_model_json(&path, &file).unwrap();
        assert!(matches!(read_model_json(&path), Err(AppError::Data(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_device_is_io_error() {
        let file = fitted_file();
        assert!(matches!(
            write_model_json(Path::new("/dev/full"), &file),
            Err(AppError::Io(_))
        ));
    }

    #[test]
    fn garbage_json_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ \"tool\": 1 }").unwrap();
        assert!(matches!(read_model_json(&path), Err(AppError::Data(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            read_model_json(Path::new("/no/such/model.json")),
            Err(AppError::Io(_))
        ));
    }
}
