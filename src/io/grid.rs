//! Read/write curve grid JSON files.
//!
//! A grid file is the portable representation of a fitted curve:
//! - run metadata (target, algorithm, timestamp)
//! - per-segment parameters and fit quality
//! - the curve sampled across its domain, plus the observed samples
//!
//! It is a plotting artifact, not a model format: nothing reloads a chain
//! from it. The schema is defined by `domain::GridFile`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;

use crate::app::pipeline::RunOutput;
use crate::domain::{CurveGrid, GridFile, RunConfig};
use crate::error::AppError;

/// Assemble the grid file for a finished run.
pub fn build_grid_file(run: &RunOutput, config: &RunConfig) -> GridFile {
    let (x, y) = run.curve.iter().copied().unzip();
    GridFile {
        tool: "para".to_string(),
        generated_at: Utc::now(),
        target: config.target,
        algorithm: config.algorithm,
        segments: run.segments.clone(),
        fit_quality: run.quality,
        grid: CurveGrid { x, y },
        samples: CurveGrid {
            x: run.sample.inputs.clone(),
            y: run.sample.targets.clone(),
        },
    }
}

/// Write a grid JSON file.
pub fn write_grid_json(path: &Path, grid: &GridFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create grid JSON '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, grid)
        .map_err(std::io::Error::from)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write grid JSON: {e}")))
}

/// Read a grid JSON file.
pub fn read_grid_json(path: &Path) -> Result<GridFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open grid JSON '{}': {e}", path.display())))?;
    let grid: GridFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(3, format!("Invalid grid JSON: {e}")))?;
    if grid.grid.x.len() != grid.grid.y.len() || grid.samples.x.len() != grid.samples.y.len() {
        return Err(AppError::new(3, "Grid JSON has mismatched x/y lengths."));
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_fit;
    use crate::curve::CurvatureSeed;
    use crate::domain::{Algorithm, FitQuality, TargetKind};

    #[test]
    fn grid_json_written_and_read_back() {
        let config = RunConfig {
            target: TargetKind::Sine,
            sample_count: 10,
            x_min: 0.0,
            x_max: 3.0,
            noise: 0.0,
            seed: 2,
            algorithm: Algorithm::Inductive,
            segments: 2,
            learning_rate: 0.01,
            epochs: 10,
            refinement_epochs: 1,
            exploration_rate: 0.4,
            curvature_seed: CurvatureSeed::NearStraight,
            parallel: false,
            plot: false,
            plot_width: 10,
            plot_height: 5,
            export_results: None,
            export_grid: None,
            export_svg: None,
        };
        let run = run_fit(&config).unwrap();
        let grid = build_grid_file(&run, &config);
        assert_eq!(grid.grid.x.len(), run.curve.len());
        assert_eq!(grid.samples.x, run.sample.inputs);

        let path = std::env::temp_dir().join(format!("paracurve-grid-{}.json", std::process::id()));
        write_grid_json(&path, &grid).unwrap();
        let back = read_grid_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back.segments, grid.segments);
        assert_eq!(back.algorithm, Algorithm::Inductive);
        assert_eq!(back.grid.x.len(), grid.grid.x.len());
    }

    #[test]
    fn failed_flush_is_reported() {
        // Writes to /dev/full fail with ENOSPC; a small grid stays buffered until the flush.
        let path = Path::new("/dev/full");
        if !path.exists() {
            return;
        }
        let grid = GridFile {
            tool: "para".to_string(),
            generated_at: Utc::now(),
            target: TargetKind::Sine,
            algorithm: Algorithm::Batch,
            segments: Vec::new(),
            fit_quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                max_abs: 0.0,
                n: 2,
            },
            grid: CurveGrid {
                x: vec![0.0, 1.0],
                y: vec![0.0, 1.0],
            },
            samples: CurveGrid {
                x: vec![0.0, 1.0],
                y: vec![0.0, 1.0],
            },
        };
        let err = write_grid_json(path, &grid).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let err = read_grid_json(Path::new("/nonexistent/paracurve.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
