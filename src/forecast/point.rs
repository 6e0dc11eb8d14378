//! Point forecast and its decomposition into trend and named components.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::Covariates;
use crate::error::AppError;
use crate::fit::prediction_data;
use crate::models::RestoredModel;

/// Per-date model terms in price units, except where noted.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Scaled time of each date.
    pub t: Vec<f64>,
    pub trend: Vec<f64>,
    /// Sum of additive terms.
    pub additive: Vec<f64>,
    /// Sum of multiplicative terms (fraction of trend).
    pub multiplicative: Vec<f64>,
    /// Each seasonality and regressor; multiplicative ones as fractions.
    pub components: BTreeMap<String, Vec<f64>>,
}

impl Decomposition {
    /// Point forecast at row `i`.
    pub fn yhat(&self, i: usize) -> f64 {
        self.trend[i] * (1.0 + self.multiplicative[i]) + self.additive[i]
    }
}

/// Decompose the forecast for `dates` (strictly increasing).
pub fn decompose(model: &RestoredModel<'_>, dates: &[NaiveDate], covariates: &Covariates) -> Result<Decomposition, AppError> {
    let config = &model.fitted.config;
    let data = prediction_data(config, &model.scaling, dates, covariates)?;
    let predictions = model.prophet.predict(data)?;
    if predictions.trend.point.len() != dates.len() {
        return Err(AppError::fit(format!(
            "Backend returned {} rows for {} dates.",
            predictions.trend.point.len(),
            dates.len()
        )));
    }

    let configured = |name: &str| {
        config.seasonalities.iter().any(|s| s.name == name) || config.regressors.iter().any(|r| r.name == name)
    };
    let components = predictions
        .seasonalities
        .into_iter()
        .chain(predictions.regressors)
        .filter(|(name, _)| configured(name))
        .map(|(name, feature)| (name, feature.point))
        .collect();

    Ok(Decomposition {
        t: dates.iter().map(|&d| model.scaling.t(d)).collect(),
        trend: predictions.trend.point,
        additive: predictions.additive.point,
        multiplicative: predictions.multiplicative.point,
        components,
    })
}
