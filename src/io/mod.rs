//! Input/output helpers.
//!
//! - per-sample residual CSV export (`export`)
//! - curve grid JSON read/write (`grid`)

pub mod export;
pub mod grid;

pub use export::*;
pub use grid::*;
