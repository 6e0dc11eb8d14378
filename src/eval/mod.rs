//! Forecast evaluation.
//!
//! - `metrics`: MAE/RMSE of a forecast against the train and test partitions
//! - `cross_validation`: rolling-origin refits over the training history
//! - `performance`: horizon-bucketed metrics of the cross-validation output

pub mod cross_validation;
pub mod metrics;
pub mod performance;

pub use cross_validation::*;
pub use metrics::*;
pub use performance::*;
