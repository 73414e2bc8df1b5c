//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - installs logging and loads `.env` overrides
//! - parses CLI arguments
//! - generates samples and trains a chain
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FitArgs, PlotArgs};
use crate::domain::RunConfig;
use crate::error::AppError;

pub mod pipeline;

/// Seed used when neither `--seed` nor `PARACURVE_SEED` is set.
pub const DEFAULT_SEED: u64 = 42;

/// Filter applied when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "paracurve=info";

/// Overrides read from the environment (and `.env`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `PARACURVE_SEED`
    pub seed: Option<u64>,
    /// `PARACURVE_THREADS`: size of the rayon pool used by exploration.
    pub threads: Option<usize>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::parse(
            std::env::var("PARACURVE_SEED").ok().as_deref(),
            std::env::var("PARACURVE_THREADS").ok().as_deref(),
        )
    }

    fn parse(seed: Option<&str>, threads: Option<&str>) -> Result<Self, AppError> {
        let seed = seed
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|e| AppError::new(2, format!("Invalid PARACURVE_SEED '{s}': {e}")))
            })
            .transpose()?;
        let threads = threads
            .map(|s| match s.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(AppError::new(2, format!("Invalid PARACURVE_THREADS '{s}': expected a positive integer"))),
            })
            .transpose()?;
        Ok(Self { seed, threads })
    }
}

/// Entry point for the `para` binary.
pub fn run() -> Result<(), AppError> {
    let env = EnvOverrides::from_env()?;
    init_tracing();
    if let Some(threads) = env.threads {
        configure_thread_pool(threads);
    }

    // `para` and `para -a batch ...` behave like `para fit ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args, env),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Keep an already installed subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn configure_thread_pool(threads: usize) {
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
        Ok(()) => debug!(threads, "configured rayon pool"),
        Err(err) => warn!(threads, error = %err, "could not configure rayon pool"),
    }
}

fn handle_fit(args: FitArgs, env: EnvOverrides) -> Result<(), AppError> {
    let config = fit_config_from_args(&args, &env);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run, &config, chrono::Local::now())
    );
    if args.top > 0 {
        println!("{}", crate::report::format_residual_table(&run.residuals, args.top));
    }

    if config.plot {
        let plot = crate::plot::render_ascii_plot(&run.sample.points(), &run.curve, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::write_results_csv(path, &run.residuals, &config)?;
    }
    if let Some(path) = &config.export_grid {
        let grid = crate::io::build_grid_file(&run, &config);
        crate::io::write_grid_json(path, &grid)?;
    }
    if let Some(path) = &config.export_svg {
        crate::plot::write_svg_plot(path, &run.sample.points(), &run.curve, config.target.display_name())?;
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let grid = crate::io::read_grid_json(&args.grid)?;
    let plot = crate::plot::render_ascii_plot_from_grid(&grid, args.width, args.height);
    println!("{plot}");

    if let Some(path) = &args.export_svg {
        crate::plot::write_svg_plot(path, &grid.samples.points(), &grid.grid.points(), grid.target.display_name())?;
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs, env: &EnvOverrides) -> RunConfig {
    RunConfig {
        target: args.target,
        sample_count: args.sample_count,
        x_min: args.x_min,
        x_max: args.x_max,
        noise: args.noise,
        seed: args.seed.or(env.seed).unwrap_or(DEFAULT_SEED),

        algorithm: args.algorithm,
        segments: args.segments,
        learning_rate: args.learning_rate,
        epochs: args.epochs,
        refinement_epochs: args.refinement_epochs,
        exploration_rate: args.exploration_rate,
        curvature_seed: args.curvature_seed.unwrap_or_else(|| args.algorithm.default_seed()),
        parallel: args.parallel,

        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,

        export_results: args.export.clone(),
        export_grid: args.export_grid.clone(),
        export_svg: args.export_svg.clone(),
    }
}

/// Rewrite argv so `para` defaults to `para fit`.
///
/// Rules:
/// - `para`                      -> `para fit`
/// - `para -a batch ...`         -> `para fit -a batch ...`
/// - `para --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurvatureSeed;
    use crate::domain::Algorithm;

    fn args(extra: &[&str]) -> FitArgs {
        let mut argv = vec!["para", "fit"];
        argv.extend_from_slice(extra);
        match crate::cli::Cli::parse_from(argv).command {
            Command::Fit(args) => args,
            Command::Plot(_) => panic!("expected fit"),
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rewrite_defaults_to_fit() {
        assert_eq!(rewrite_args(strings(&["para"])), strings(&["para", "fit"]));
        assert_eq!(
            rewrite_args(strings(&["para", "-a", "batch"])),
            strings(&["para", "fit", "-a", "batch"])
        );
        assert_eq!(rewrite_args(strings(&["para", "--help"])), strings(&["para", "--help"]));
        assert_eq!(
            rewrite_args(strings(&["para", "plot", "--grid", "g.json"])),
            strings(&["para", "plot", "--grid", "g.json"])
        );
    }

    #[test]
    fn seed_precedence_is_flag_then_env_then_default() {
        let env = EnvOverrides {
            seed: Some(7),
            threads: None,
        };
        assert_eq!(fit_config_from_args(&args(&["--seed", "3"]), &env).seed, 3);
        assert_eq!(fit_config_from_args(&args(&[]), &env).seed, 7);
        assert_eq!(fit_config_from_args(&args(&[]), &EnvOverrides::default()).seed, DEFAULT_SEED);
    }

    #[test]
    fn curvature_seed_defaults_per_algorithm() {
        let env = EnvOverrides::default();
        let batch = fit_config_from_args(&args(&["-a", "batch"]), &env);
        assert_eq!(batch.curvature_seed, CurvatureSeed::Bisector);
        let explore = fit_config_from_args(&args(&[]), &env);
        assert_eq!(explore.algorithm, Algorithm::Explore);
        assert_eq!(explore.curvature_seed, CurvatureSeed::NearStraight);
        let forced = fit_config_from_args(&args(&["-a", "batch", "--curvature-seed", "near-straight"]), &env);
        assert_eq!(forced.curvature_seed, CurvatureSeed::NearStraight);
        assert!(!fit_config_from_args(&args(&["--no-plot"]), &env).plot);
    }

    #[test]
    fn env_overrides_parse() {
        assert_eq!(
            EnvOverrides::parse(Some("12"), Some(" 4 ")).unwrap(),
            EnvOverrides {
                seed: Some(12),
                threads: Some(4)
            }
        );
        assert_eq!(EnvOverrides::parse(None, None).unwrap(), EnvOverrides::default());
        assert_eq!(EnvOverrides::parse(Some("abc"), None).unwrap_err().exit_code(), 2);
        assert!(EnvOverrides::parse(None, Some("0")).is_err());
    }
}
