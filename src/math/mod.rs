//! Descriptive statistics used by scaling, intervals and evaluation.

pub mod stats;

pub use stats::*;
