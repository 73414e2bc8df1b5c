//! Export per-sample results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{RunConfig, SampleResidual};
use crate::error::AppError;

/// Write per-sample results to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[SampleResidual], config: &RunConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_results(&mut out, residuals, config)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))
}

fn write_results<W: Write>(out: &mut W, residuals: &[SampleResidual], config: &RunConfig) -> std::io::Result<()> {
    writeln!(out, "index,x,y_obs,y_true,y_fit,residual,target,algorithm,segments")?;
    let target = format!("{:?}", config.target).to_lowercase();
    let algorithm = format!("{:?}", config.algorithm).to_lowercase();
    for (i, r) in residuals.iter().enumerate() {
        writeln!(
            out,
            "{},{:.10},{:.10},{:.10},{:.10},{:.10},{},{},{}",
            i, r.x, r.y_obs, r.y_true, r.y_fit, r.residual, target, algorithm, config.segments
        )?;
    }
    Ok(())
}
