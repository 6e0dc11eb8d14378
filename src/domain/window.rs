//! Auxiliary model inputs: date-window flags and aligned covariate columns.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Observation;
use crate::error::AppError;

/// A named, inclusive date interval that becomes a 0/1 column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::config("Date window name must not be empty."));
        }
        if end < start {
            return Err(AppError::config(format!(
                "Date window `{name}` ends ({end}) before it starts ({start})."
            )));
        }
        Ok(Self { name, start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `1.0` inside the window, `0.0` outside.
    pub fn flags(&self, dates: &[NaiveDate]) -> Vec<f64> {
        dates
            .iter()
            .map(|&d| if self.contains(d) { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Named columns aligned to a list of dates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Covariates {
    len: usize,
    columns: BTreeMap<String, Vec<f64>>,
}

impl Covariates {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            columns: BTreeMap::new(),
        }
    }

    /// Build one flag column per window.
    pub fn from_windows(windows: &[DateWindow], dates: &[NaiveDate]) -> Result<Self, AppError> {
        let mut out = Self::new(dates.len());
        for w in windows {
            out.insert(w.name.clone(), w.flags(dates))?;
        }
        Ok(out)
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), AppError> {
        let name = name.into();
        if values.len() != self.len {
            return Err(AppError::data(format!(
                "Covariate `{name}` has {} values but {} dates.",
                values.len(),
                self.len
            )));
        }
        if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
            return Err(AppError::data(format!(
                "Covariate `{name}` has a non-finite value at row {bad}."
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column lookup that fails with a data error naming the missing column.
    pub fn require(&self, name: &str) -> Result<&[f64], AppError> {
        self.get(name)
            .ok_or_else(|| AppError::data(format!("Missing covariate column `{name}`.")))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            len: range.len(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), v[range.clone()].to_vec()))
                .collect(),
        }
    }
}

/// Everything the fitter needs: dates, target values and covariates.
///
/// Serialized as plain columns; deserializing re-checks their alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameColumns", into = "FrameColumns")]
pub struct TrainingFrame {
    pub dates: Vec<NaiveDate>,
    pub y: Vec<f64>,
    pub covariates: Covariates,
}

impl TrainingFrame {
    pub fn new(dates: Vec<NaiveDate>, y: Vec<f64>, covariates: Covariates) -> Result<Self, AppError> {
        if dates.len() != y.len() || covariates.len() != dates.len() {
            return Err(AppError::data(format!(
                "Misaligned training frame: {} dates, {} values, {} covariate rows.",
                dates.len(),
                y.len(),
                covariates.len()
            )));
        }
        Ok(Self { dates, y, covariates })
    }

    pub fn from_observations(observations: &[Observation], windows: &[DateWindow]) -> Result<Self, AppError> {
        let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
        let y = observations.iter().map(|o| o.price).collect();
        let covariates = Covariates::from_windows(windows, &dates)?;
        Self::new(dates, y, covariates)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            dates: self.dates[range.clone()].to_vec(),
            y: self.y[range.clone()].to_vec(),
            covariates: self.covariates.slice(range),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct FrameColumns {
    dates: Vec<NaiveDate>,
    y: Vec<f64>,
    #[serde(default)]
    covariates: BTreeMap<String, Vec<f64>>,
}

impl From<TrainingFrame> for FrameColumns {
    fn from(frame: TrainingFrame) -> Self {
        Self {
            dates: frame.dates,
            y: frame.y,
            covariates: frame.covariates.columns,
        }
    }
}

impl TryFrom<FrameColumns> for TrainingFrame {
    type Error = AppError;

    fn try_from(raw: FrameColumns) -> Result<Self, AppError> {
        let mut covariates = Covariates::new(raw.dates.len());
        for (name, values) in raw.covariates {
            covariates.insert(name, values)?;
        }
        Self::new(raw.dates, raw.y, covariates)
    }
}
