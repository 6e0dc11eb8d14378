//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the observed data (`Observation`, `Series`)
//! - the train/test partition (`Split`)
//! - auxiliary model inputs (`DateWindow`, `Covariates`, `TrainingFrame`)
//! - pipeline outputs (`Forecast`, `MetricPair`, `Evaluation`)

pub mod split;
pub mod types;
pub mod window;

pub use split::*;
pub use types::*;
pub use window::*;
