//! Reporting utilities: residuals, fit quality and formatted terminal output.

pub mod format;

pub use format::*;

use crate::curve::Chain;
use crate::data::SampleData;
use crate::domain::{FitQuality, SampleResidual, SegmentParams};
use crate::error::AppError;

/// Compute fitted values and residuals for each sample.
pub fn compute_residuals(chain: &Chain, sample: &SampleData) -> Result<Vec<SampleResidual>, AppError> {
    let mut out = Vec::with_capacity(sample.len());
    for ((&x, &y_obs), &y_true) in sample.inputs.iter().zip(&sample.targets).zip(&sample.clean) {
        let y_fit = chain.evaluate(x)?;
        if !y_fit.is_finite() {
            return Err(AppError::new(4, "Non-finite chain evaluation during residual computation."));
        }
        out.push(SampleResidual {
            x,
            y_obs,
            y_true,
            y_fit,
            residual: y_obs - y_fit,
        });
    }
    Ok(out)
}

pub fn fit_quality(residuals: &[SampleResidual]) -> FitQuality {
    let n = residuals.len();
    let sse: f64 = residuals.iter().map(|r| r.residual * r.residual).sum();
    let rmse = if n == 0 { 0.0 } else { (sse / n as f64).sqrt() };
    let max_abs = residuals.iter().map(|r| r.residual.abs()).fold(0.0, f64::max);
    FitQuality { sse, rmse, max_abs, n }
}

/// Per-segment parameters with the x-interval each segment owns.
pub fn segment_params(chain: &Chain) -> Vec<SegmentParams> {
    let (h, _) = chain.origin();
    chain
        .setup_boundaries(h)
        .into_iter()
        .zip(chain.segments())
        .map(|(b, s)| SegmentParams {
            index: b.index,
            length: s.length,
            angle: s.angle,
            curvature: s.curvature,
            start: b.start,
            end: b.end,
        })
        .collect()
}
