//! Input data for a run.
//!
//! - synthetic samples of a known target function (`sample`)

pub mod sample;

pub use sample::*;
