//! Model fitting on the `augurs-prophet` backend.
//!
//! - `prophet`: options, components and data frames for the backend
//! - `optimizer`: the Stan optimizer that records its estimate, and the replay
//!   optimizer that restores a saved one
//! - `trend`: trend evaluation for simulated forecast paths

pub mod optimizer;
pub mod prophet;
pub mod trend;

pub use optimizer::*;
pub use prophet::*;
pub use trend::*;
