//! Forecasting model definition.
//!
//! - `config`: trend, seasonality and regressor settings plus validation
//! - `scaling`: target, time and regressor transforms fixed by the history
//! - `model`: the unfit `ForecastModel` and the serializable `FittedModel`

pub mod config;
pub mod model;
pub mod scaling;

pub use config::*;
pub use model::*;
pub use scaling::*;
