//! Formatted terminal output.
//!
//! Formatting lives in one place so the training code stays free of printing
//! and output changes stay localized.

use chrono::{DateTime, Local};

use crate::app::pipeline::RunOutput;
use crate::domain::{RunConfig, SampleResidual};
use crate::fit::Candidate;

/// Format the full run summary (sample, hyperparameters, fit diagnostics, segments).
pub fn format_run_summary(run: &RunOutput, config: &RunConfig, generated_at: DateTime<Local>) -> String {
    let mut out = String::new();

    out.push_str("=== para - paravector curve fit ===\n");
    out.push_str(&format!("Generated: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("Target: {}\n", config.target.display_name()));
    out.push_str(&format!(
        "Sample: n={} | x=[{:.3}, {:.3}] | noise={:.3} | seed={}\n",
        run.sample.len(),
        config.x_min,
        config.x_max,
        config.noise,
        config.seed,
    ));
    out.push_str(&format!(
        "Algorithm: {} | segments={} | lr={} | epochs={} | curvature seed={}\n",
        config.algorithm.display_name(),
        config.segments,
        config.learning_rate,
        config.epochs,
        config.curvature_seed.display_name(),
    ));
    if !run.candidates.is_empty() {
        out.push_str(&format!(
            "Exploration: restarts={} | rate={} | parallel={}\n",
            config.refinement_epochs, config.exploration_rate, config.parallel,
        ));
    }

    out.push_str("\nFit quality:\n");
    out.push_str(&format!(
        "  SSE={:.6} RMSE={:.6} max|r|={:.6} n={}\n",
        run.quality.sse, run.quality.rmse, run.quality.max_abs, run.quality.n
    ));
    if let Some(&(epoch, loss)) = run.losses.last() {
        out.push_str(&format!("  final training loss={loss:.6} (report #{epoch})\n"));
    }

    out.push_str("\nSegments:\n");
    out.push_str(&format!(
        "{:>3} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "#", "length", "angle", "curvature", "start", "end"
    ));
    for s in &run.segments {
        out.push_str(&format!(
            "{:>3} {:>10.5} {:>10.5} {:>10.5} {:>10.4} {:>10.4}\n",
            s.index, s.length, s.angle, s.curvature, s.start, s.end
        ));
    }

    if !run.candidates.is_empty() {
        out.push('\n');
        out.push_str(&format_candidates(&run.candidates, run.best_restart));
    }

    out
}

/// Format exploration restarts, marking the accepted one with `*`.
pub fn format_candidates(candidates: &[Candidate], best: Option<usize>) -> String {
    let mut out = String::new();
    out.push_str("Restarts:\n");
    for c in candidates {
        let chosen = if Some(c.index) == best { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} #{:<3} lr={:.6} epochs={:<6} score={:.6}\n",
            c.index, c.learning_rate, c.epochs, c.score
        ));
    }
    out
}

/// Format the `limit` samples with the largest absolute residual.
pub fn format_residual_table(residuals: &[SampleResidual], limit: usize) -> String {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual.abs().total_cmp(&a.residual.abs()));

    let mut out = String::new();
    out.push_str(&format!("Largest residuals (top {}):\n", limit.min(sorted.len())));
    out.push_str(
        format!("{:>10} {:>12} {:>12} {:>12} {:>12}\n", "x", "y_obs", "y_true", "y_fit", "residual").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<10} {:-<12} {:-<12} {:-<12} {:-<12}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in sorted.iter().take(limit) {
        out.push_str(&format!(
            "{:>10.4} {:>12.5} {:>12.5} {:>12.5} {:>12.5}\n",
            r.x, r.y_obs, r.y_true, r.y_fit, r.residual
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residual(x: f64, residual: f64) -> SampleResidual {
        SampleResidual {
            x,
            y_obs: residual,
            y_true: 0.0,
            y_fit: 0.0,
            residual,
        }
    }

    #[test]
    fn residual_table_sorts_by_magnitude() {
        let rows = [residual(0.0, 0.1), residual(1.0, -0.9), residual(2.0, 0.5)];
        let txt = format_residual_table(&rows, 2);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Largest residuals (top 2):");
        assert_eq!(lines.len(), 5);
        assert!(lines[3].trim_start().starts_with("1.0000"));
        assert!(lines[4].trim_start().starts_with("2.0000"));
    }

    #[test]
    fn candidates_mark_the_best() {
        let candidates = [
            Candidate {
                index: 0,
                learning_rate: 0.01,
                epochs: 10,
                score: 2.0,
            },
            Candidate {
                index: 1,
                learning_rate: 0.012,
                epochs: 11,
                score: 1.0,
            },
        ];
        let txt = format_candidates(&candidates, Some(1));
        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[1].starts_with("  #0"));
        assert!(lines[2].starts_with("* #1"));
    }
}
