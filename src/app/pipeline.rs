//! Shared "fit pipeline" logic.
//!
//! sample generation -> training -> residuals -> quality -> sampled curve
//!
//! The CLI only has to handle presentation (printing, plots, exports).

use tracing::info;

use crate::autodiff::Tape;
use crate::curve::Chain;
use crate::data::{generate_sample, SampleData};
use crate::domain::{Algorithm, FitQuality, RunConfig, SampleResidual, SegmentParams};
use crate::error::AppError;
use crate::fit::{
    fit, inductive_descent, inductive_exploration, squared_error, BatchOptions, Candidate, ExplorationOptions,
    InductiveOptions,
};

/// Points used when sampling the fitted curve for plots and grid exports.
pub const CURVE_RESOLUTION: usize = 201;

/// All computed outputs of a single `para fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub sample: SampleData,
    pub chain: Chain,
    pub residuals: Vec<SampleResidual>,
    pub quality: FitQuality,
    pub segments: Vec<SegmentParams>,
    /// Progress reports as `(index, loss)`: per epoch for batch descent,
    /// per accepted best for exploration, empty for inductive descent.
    pub losses: Vec<(usize, f64)>,
    /// Exploration restarts (empty for the other algorithms).
    pub candidates: Vec<Candidate>,
    pub best_restart: Option<usize>,
    /// The fitted chain sampled across its domain.
    pub curve: Vec<(f64, f64)>,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    if config.segments == 0 {
        return Err(AppError::new(2, "Segment count must be > 0."));
    }
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(AppError::new(2, "Learning rate must be finite and > 0."));
    }

    // 1) Generate the synthetic sample.
    let sample = generate_sample(config)?;
    run_fit_with_sample(config, sample)
}

/// Execute training and reporting on an already generated sample.
pub fn run_fit_with_sample(config: &RunConfig, sample: SampleData) -> Result<RunOutput, AppError> {
    let loss = squared_error::<Tape>;
    let mut losses = Vec::new();
    let mut candidates = Vec::new();
    let mut best_restart = None;

    // 2) Train.
    let chain = match config.algorithm {
        Algorithm::Batch => {
            let opts = BatchOptions {
                learning_rate: config.learning_rate,
                max_epochs: config.epochs,
                curvature_seed: config.curvature_seed,
                ..BatchOptions::default()
            };
            fit(config.segments, &sample.inputs, &sample.targets, &opts, &loss, |epoch, l| {
                losses.push((epoch, l))
            })?
        }
        Algorithm::Inductive => {
            let opts = inductive_options(config);
            inductive_descent(config.segments, &sample.inputs, &sample.targets, &opts, &loss)?
        }
        Algorithm::Explore => {
            let base = inductive_options(config);
            let opts = ExplorationOptions {
                refinement_epochs: config.refinement_epochs,
                exploration_rate: config.exploration_rate,
                seed: Some(config.seed),
                parallel: config.parallel,
                error: None,
            };
            let result = inductive_exploration(
                config.segments,
                &sample.inputs,
                &sample.targets,
                &base,
                &loss,
                &opts,
                |restart, score| losses.push((restart, score)),
            )?;
            candidates = result.candidates;
            best_restart = Some(result.best.index);
            result.chain
        }
    };

    // 3) Residuals, quality and the sampled curve.
    let residuals = crate::report::compute_residuals(&chain, &sample)?;
    let quality = crate::report::fit_quality(&residuals);
    let segments = crate::report::segment_params(&chain);
    let curve = crate::plot::sample_chain(&chain, CURVE_RESOLUTION)?;

    info!(
        algorithm = config.algorithm.display_name(),
        segments = config.segments,
        sse = quality.sse,
        rmse = quality.rmse,
        "fit complete"
    );

    Ok(RunOutput {
        sample,
        chain,
        residuals,
        quality,
        segments,
        losses,
        candidates,
        best_restart,
        curve,
    })
}

fn inductive_options(config: &RunConfig) -> InductiveOptions {
    InductiveOptions {
        learning_rate: config.learning_rate,
        epochs: config.epochs,
        curvature_seed: config.curvature_seed,
        ..InductiveOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetKind;

    fn config(algorithm: Algorithm) -> RunConfig {
        RunConfig {
            target: TargetKind::Parabola,
            sample_count: 12,
            x_min: -1.0,
            x_max: 1.0,
            noise: 0.0,
            seed: 5,
            algorithm,
            segments: 2,
            learning_rate: 0.01,
            epochs: 20,
            refinement_epochs: 3,
            exploration_rate: 0.4,
            curvature_seed: algorithm.default_seed(),
            parallel: false,
            plot: false,
            plot_width: 60,
            plot_height: 15,
            export_results: None,
            export_grid: None,
            export_svg: None,
        }
    }

    #[test]
    fn every_algorithm_produces_a_full_report() {
        for algorithm in [Algorithm::Batch, Algorithm::Inductive, Algorithm::Explore] {
            let run = run_fit(&config(algorithm)).unwrap();
            assert_eq!(run.chain.len(), 2);
            assert_eq!(run.residuals.len(), 12);
            assert_eq!(run.segments.len(), 2);
            assert_eq!(run.curve.len(), CURVE_RESOLUTION);
            assert!(run.quality.sse.is_finite());
            match algorithm {
                Algorithm::Batch => assert!(!run.losses.is_empty()),
                Algorithm::Inductive => assert!(run.candidates.is_empty()),
                Algorithm::Explore => {
                    assert_eq!(run.candidates.len(), 3);
                    assert!(run.best_restart.is_some());
                }
            }
        }
    }

    #[test]
    fn rejects_zero_segments() {
        let mut bad = config(Algorithm::Batch);
        bad.segments = 0;
        assert_eq!(run_fit(&bad).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn too_few_samples_is_an_input_error() {
        let mut bad = config(Algorithm::Inductive);
        bad.sample_count = 2;
        assert_eq!(run_fit(&bad).unwrap_err().exit_code(), 3);
    }
}
