//! Forecasting with a fitted model.
//!
//! - `point`: trend/seasonal/regressor decomposition at the MAP estimate
//! - `uncertainty`: simulated trend/noise paths and their percentiles

pub mod point;
pub mod uncertainty;

pub use point::*;
pub use uncertainty::*;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{Covariates, Forecast, ForecastPoint};
use crate::error::AppError;
use crate::models::FittedModel;

/// Forecast `dates` (strictly increasing) with aligned `covariates`.
pub fn predict(
    fitted: &FittedModel,
    dates: &[NaiveDate],
    covariates: &Covariates,
    seed: u64,
) -> Result<Forecast, AppError> {
    if let Some(i) = dates.windows(2).position(|w| w[0] >= w[1]) {
        return Err(AppError::data(format!(
            "Forecast dates must be strictly increasing ({} then {}).",
            dates[i],
            dates[i + 1]
        )));
    }
    if dates.is_empty() {
        return Ok(Forecast {
            points: Vec::new(),
            components: BTreeMap::new(),
        });
    }

    let restored = fitted.restore()?;
    let decomposition = decompose(&restored, dates, covariates)?;

    let intervals = if fitted.config.uncertainty_samples > 0 {
        Some(predictive_intervals(&restored, &decomposition, seed)?)
    } else {
        None
    };

    let points = dates
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let bounds = intervals.as_ref().map(|iv| iv[i]);
            ForecastPoint {
                date,
                yhat: decomposition.yhat(i),
                yhat_lower: bounds.map(|b| b.0),
                yhat_upper: bounds.map(|b| b.1),
                trend: decomposition.trend[i],
                additive: decomposition.additive[i],
                multiplicative: decomposition.multiplicative[i],
            }
        })
        .collect();

    tracing::debug!(dates = dates.len(), seed, "forecast computed");

    Ok(Forecast {
        points,
        components: decomposition.components,
    })
}
