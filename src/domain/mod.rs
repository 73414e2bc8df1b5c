//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration enums (`TargetKind`, `Algorithm`)
//! - per-sample fit results (`SampleResidual`, `FitQuality`)
//! - the portable curve grid file (`GridFile`)

pub mod types;

pub use types::*;
