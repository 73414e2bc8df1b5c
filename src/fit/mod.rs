//! Training procedures for chains.
//!
//! - `batch`: joint gradient descent over every segment at once
//! - `inductive`: one segment at a time, right to left, stitched by an
//!   endpoint penalty
//! - `exploration`: random restarts of inductive descent, keeping the best

pub mod batch;
pub mod exploration;
pub mod inductive;
pub mod loss;

pub use batch::*;
pub use exploration::*;
pub use inductive::*;
pub use loss::*;

use crate::error::CurveError;

/// Check the sample arrays shared by every training procedure.
///
/// Requires matching lengths, finite values, strictly increasing inputs and
/// more samples than segments (so every segment gets a non-empty range).
pub fn validate_samples(total: usize, inputs: &[f64], targets: &[f64]) -> Result<(), CurveError> {
    if total == 0 {
        return Err(CurveError::InvalidInput("segment count must be > 0".to_string()));
    }
    if inputs.len() != targets.len() {
        return Err(CurveError::InvalidInput(format!(
            "{} inputs but {} targets",
            inputs.len(),
            targets.len()
        )));
    }
    if inputs.len() <= total {
        return Err(CurveError::InvalidInput(format!(
            "{} samples cannot seed {total} segments (need more samples than segments)",
            inputs.len()
        )));
    }
    if inputs.iter().chain(targets).any(|v| !v.is_finite()) {
        return Err(CurveError::InvalidInput("samples must be finite".to_string()));
    }
    if inputs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CurveError::InvalidInput("inputs must be strictly increasing".to_string()));
    }
    Ok(())
}
