//! Pointwise losses.

use crate::autodiff::Backend;
use crate::error::CurveError;

/// `(output − target)²` on any backend.
///
/// Pass as `squared_error::<Tape>` where a training loss is expected.
pub fn squared_error<B: Backend>(b: &mut B, output: B::Value, target: f64) -> Result<B::Value, CurveError> {
    let target = b.leaf(target)?;
    let diff = b.sub(output, target)?;
    b.square(diff)
}

/// Plain squared error used to score fitted chains.
pub fn squared_error_score(predicted: f64, target: f64) -> f64 {
    let diff = predicted - target;
    diff * diff
}
