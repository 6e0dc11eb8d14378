//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory across the pipeline stages
//! - exported to CSV/JSON
//! - reloaded later for future forecasts

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Normalize a date to the first day of its month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// One monthly price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    /// Price in currency units per gallon.
    pub price: f64,
}

/// Ordered monthly series, immutable once constructed.
///
/// Invariants:
/// - dates strictly increasing, at most one observation per month
/// - prices finite and non-negative
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    pub fn new(observations: Vec<Observation>) -> Result<Self, AppError> {
        for (idx, obs) in observations.iter().enumerate() {
            if !obs.price.is_finite() || obs.price < 0.0 {
                return Err(AppError::data(format!(
                    "Observation {idx} ({}) has invalid price {}.",
                    obs.date, obs.price
                )));
            }
        }
        for pair in observations.windows(2) {
            let (a, b) = (pair[0].date, pair[1].date);
            if month_start(b) <= month_start(a) {
                return Err(AppError::data(format!(
                    "Dates must be strictly increasing by month: {a} is followed by {b}."
                )));
            }
        }
        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.price).collect()
    }

    pub fn price_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for o in &self.observations {
            min = min.min(o.price);
            max = max.max(o.price);
        }
        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }
}

/// One forecasted date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    /// Lower interval bound; absent when uncertainty sampling is disabled.
    pub yhat_lower: Option<f64>,
    pub yhat_upper: Option<f64>,
    pub trend: f64,
    /// Sum of additive seasonal/regressor terms (price units).
    pub additive: f64,
    /// Sum of multiplicative terms (fraction of trend).
    pub multiplicative: f64,
}

/// Forecast over an ordered list of dates, plus per-component contributions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    pub points: Vec<ForecastPoint>,
    /// Contribution of each named seasonality/regressor, aligned with `points`.
    pub components: BTreeMap<String, Vec<f64>>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Look up the prediction for a date (points are sorted by date).
    pub fn get(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points
            .binary_search_by(|p| p.date.cmp(&date))
            .ok()
            .map(|idx| &self.points[idx])
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}

/// MAE/RMSE over one partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPair {
    pub n: usize,
    pub mae: f64,
    pub rmse: f64,
}

/// Metric pairs for both sides of the split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub train: MetricPair,
    pub test: MetricPair,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn series_rejects_unsorted_and_duplicate_months() {
        let unsorted = vec![
            Observation { date: d(2000, 2), price: 1.0 },
            Observation { date: d(2000, 1), price: 1.0 },
        ];
        assert!(matches!(Series::new(unsorted), Err(AppError::Data(_))));

        let duplicate = vec![
            Observation { date: d(2000, 1), price: 1.0 },
            Observation { date: NaiveDate::from_ymd_opt(2000, 1, 15).unwrap(), price: 1.0 },
        ];
        assert!(matches!(Series::new(duplicate), Err(AppError::Data(_))));
    }

    #[test]
    fn series_rejects_negative_price() {
        let obs = vec![Observation { date: d(2000, 1), price: -0.1 }];
        assert!(matches!(Series::new(obs), Err(AppError::Data(_))));
    }

    #[test]
    fn forecast_lookup_by_date() {
        let points = (1..=3)
            .map(|m| ForecastPoint {
                date: d(2001, m),
                yhat: m as f64,
                yhat_lower: None,
                yhat_upper: None,
                trend: m as f64,
                additive: 0.0,
                multiplicative: 0.0,
            })
            .collect();
        let fc = Forecast { points, components: BTreeMap::new() };
        assert_eq!(fc.get(d(2001, 2)).map(|p| p.yhat), Some(2.0));
        assert!(fc.get(d(2001, 4)).is_none());
    }
}
