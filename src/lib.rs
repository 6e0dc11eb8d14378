//! `gas-forecast` library crate.
//!
//! The binary (`gasfc`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the model, fitter and evaluator can be reused on other monthly series

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod eval;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
