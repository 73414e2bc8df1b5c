//! Command-line parsing for the paravector curve fitter.
//!
//! Keeps **argument parsing** and **command dispatch** separate from the
//! training code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::curve::CurvatureSeed;
use crate::domain::{Algorithm, TargetKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "para", version, about = "Piecewise paravector curve fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a chain to synthetic samples, print diagnostics, and optionally plot/export.
    Fit(FitArgs),
    /// Plot a previously exported grid JSON.
    Plot(PlotArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Target function to sample.
    #[arg(short = 't', long, value_enum, default_value_t = TargetKind::Sine)]
    pub target: TargetKind,

    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 40)]
    pub sample_count: usize,

    /// Smallest sampled x.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x_min: f64,

    /// Largest sampled x.
    #[arg(long, default_value_t = 6.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Standard deviation of Gaussian noise added to the targets.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for noise and exploration (falls back to PARACURVE_SEED, then 42).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Training procedure.
    #[arg(short = 'a', long, value_enum, default_value_t = Algorithm::Explore)]
    pub algorithm: Algorithm,

    /// Number of segments in the chain.
    #[arg(short = 's', long, default_value_t = 4)]
    pub segments: usize,

    /// Base learning rate.
    #[arg(long, default_value_t = 0.01)]
    pub learning_rate: f64,

    /// Epoch budget (total for batch, per segment for inductive/explore).
    #[arg(short = 'e', long, default_value_t = 500)]
    pub epochs: usize,

    /// Number of exploration restarts.
    #[arg(long, default_value_t = 10)]
    pub refinement_epochs: usize,

    /// Relative jitter applied to learning rate and epochs per restart.
    #[arg(long, default_value_t = 0.4)]
    pub exploration_rate: f64,

    /// Initial curvature of seeded segments (defaults per algorithm).
    #[arg(long, value_enum)]
    pub curvature_seed: Option<CurvatureSeed>,

    /// Run exploration restarts in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Show the N largest residuals.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Export per-sample results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the sampled curve (segments + quality + grid) to JSON.
    #[arg(long = "export-grid")]
    pub export_grid: Option<PathBuf>,

    /// Export an SVG chart of samples and fitted curve.
    #[arg(long = "export-svg")]
    pub export_svg: Option<PathBuf>,
}

/// Options for plotting a saved grid.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Grid JSON file produced by `para fit --export-grid`.
    #[arg(long, value_name = "JSON")]
    pub grid: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Also write the chart as SVG.
    #[arg(long = "export-svg")]
    pub export_svg: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_defaults() {
        let cli = Cli::parse_from(["para", "fit"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.algorithm, Algorithm::Explore);
        assert_eq!(args.segments, 4);
        assert_eq!(args.seed, None);
        assert!(args.plot && !args.no_plot);
        assert_eq!(args.curvature_seed, None);
    }

    #[test]
    fn fit_flags_parse() {
        let cli = Cli::parse_from([
            "para",
            "fit",
            "-t",
            "parabola",
            "--x-min",
            "-2",
            "-a",
            "batch",
            "--curvature-seed",
            "near-straight",
            "--parallel",
            "--seed",
            "9",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.target, TargetKind::Parabola);
        assert_eq!(args.x_min, -2.0);
        assert_eq!(args.algorithm, Algorithm::Batch);
        assert_eq!(args.curvature_seed, Some(CurvatureSeed::NearStraight));
        assert!(args.parallel);
        assert_eq!(args.seed, Some(9));
    }

    #[test]
    fn plot_requires_a_grid() {
        assert!(Cli::try_parse_from(["para", "plot"]).is_err());
        let cli = Cli::parse_from(["para", "plot", "--grid", "curve.json"]);
        assert!(matches!(cli.command, Command::Plot(_)));
    }
}
