//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during a run
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::curve::CurvatureSeed;

/// Synthetic target function to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Sine,
    Cosine,
    Parabola,
    Cubic,
    /// Unit step at `x = 0`, smoothed by a steep logistic.
    Step,
    /// `sqrt(|x|)`.
    Sqrt,
}

impl TargetKind {
    pub fn eval(self, x: f64) -> f64 {
        match self {
            TargetKind::Sine => x.sin(),
            TargetKind::Cosine => x.cos(),
            TargetKind::Parabola => x * x,
            TargetKind::Cubic => x * x * x,
            TargetKind::Step => 1.0 / (1.0 + (-10.0 * x).exp()),
            TargetKind::Sqrt => x.abs().sqrt(),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TargetKind::Sine => "sin(x)",
            TargetKind::Cosine => "cos(x)",
            TargetKind::Parabola => "x^2",
            TargetKind::Cubic => "x^3",
            TargetKind::Step => "step(x)",
            TargetKind::Sqrt => "sqrt(|x|)",
        }
    }
}

/// Which training procedure to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Joint descent over every segment.
    Batch,
    /// One segment at a time, right to left.
    Inductive,
    /// Randomized restarts of inductive descent.
    Explore,
}

impl Algorithm {
    pub fn display_name(self) -> &'static str {
        match self {
            Algorithm::Batch => "batch descent",
            Algorithm::Inductive => "inductive descent",
            Algorithm::Explore => "inductive exploration",
        }
    }

    /// Curvature seed used when none is given explicitly.
    pub fn default_seed(self) -> CurvatureSeed {
        match self {
            Algorithm::Batch => CurvatureSeed::Bisector,
            Algorithm::Inductive | Algorithm::Explore => CurvatureSeed::NearStraight,
        }
    }
}

/// A per-sample fitted result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleResidual {
    pub x: f64,
    pub y_obs: f64,
    /// Noise-free target value at `x`.
    pub y_true: f64,
    pub y_fit: f64,
    /// `y_obs - y_fit`
    pub residual: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub max_abs: f64,
    pub n: usize,
}

/// Parameters of one fitted segment, with the x-interval it owns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    pub index: usize,
    pub length: f64,
    pub angle: f64,
    pub curvature: f64,
    pub start: f64,
    pub end: f64,
}

/// A sampled curve: `y[i]` is the curve height at `x[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl CurveGrid {
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }
}

/// Portable curve JSON written by `para fit --export-grid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub target: TargetKind,
    pub algorithm: Algorithm,
    pub segments: Vec<SegmentParams>,
    pub fit_quality: FitQuality,
    pub grid: CurveGrid,
    /// Observed samples the curve was fitted to.
    pub samples: CurveGrid,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and environment overrides).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: TargetKind,
    pub sample_count: usize,
    pub x_min: f64,
    pub x_max: f64,
    /// Standard deviation of the Gaussian noise added to targets.
    pub noise: f64,
    pub seed: u64,

    pub algorithm: Algorithm,
    pub segments: usize,
    pub learning_rate: f64,
    /// Epoch budget (total for batch, per segment for inductive).
    pub epochs: usize,
    pub refinement_epochs: usize,
    pub exploration_rate: f64,
    pub curvature_seed: CurvatureSeed,
    /// Run exploration restarts on the rayon pool.
    pub parallel: bool,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_grid: Option<PathBuf>,
    pub export_svg: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_evaluate_their_functions() {
        assert_eq!(TargetKind::Parabola.eval(-2.0), 4.0);
        assert_eq!(TargetKind::Cubic.eval(-2.0), -8.0);
        assert_eq!(TargetKind::Sqrt.eval(-4.0), 2.0);
        assert_eq!(TargetKind::Step.eval(0.0), 0.5);
        assert!(TargetKind::Step.eval(2.0) > 0.99);
        assert_eq!(TargetKind::Cosine.eval(0.0), 1.0);
    }

    #[test]
    fn algorithms_pick_their_curvature_seed() {
        assert_eq!(Algorithm::Batch.default_seed(), CurvatureSeed::Bisector);
        assert_eq!(Algorithm::Explore.default_seed(), CurvatureSeed::NearStraight);
    }

    #[test]
    fn grid_file_round_trips_through_json() {
        let file = GridFile {
            tool: "para".to_string(),
            generated_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            target: TargetKind::Sine,
            algorithm: Algorithm::Inductive,
            segments: vec![SegmentParams {
                index: 0,
                length: 1.0,
                angle: 0.1,
                curvature: 0.01,
                start: 0.0,
                end: 0.995,
            }],
            fit_quality: FitQuality {
                sse: 0.1,
                rmse: 0.05,
                max_abs: 0.2,
                n: 4,
            },
            grid: CurveGrid {
                x: vec![0.0, 1.0],
                y: vec![0.0, 0.8],
            },
            samples: CurveGrid {
                x: vec![0.0],
                y: vec![0.1],
            },
        };
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("\"algorithm\":\"inductive\""));
        let back: GridFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, file);
    }
}
