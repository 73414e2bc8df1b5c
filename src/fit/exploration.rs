//! Randomized restarts of inductive descent.
//!
//! Every restart perturbs the learning rate and the epoch budget by a uniform
//! factor in `1 ± rate/2`, trains a fresh chain and scores it over all samples.
//! The strictly lowest score wins; ties keep the earlier restart.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::autodiff::{NodeId, Tape};
use crate::curve::Chain;
use crate::error::CurveError;
use crate::fit::inductive::{inductive_descent, InductiveOptions};
use crate::fit::loss::squared_error_score;
use crate::fit::validate_samples;

#[derive(Debug, Clone, Copy)]
pub struct ExplorationOptions {
    /// Number of restarts.
    pub refinement_epochs: usize,
    pub exploration_rate: f64,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Run restarts on the rayon pool.
    pub parallel: bool,
    /// Scoring error per sample as `(predicted, target)`; squared error when unset.
    pub error: Option<fn(f64, f64) -> f64>,
}

impl Default for ExplorationOptions {
    fn default() -> Self {
        Self {
            refinement_epochs: 10,
            exploration_rate: 0.4,
            seed: None,
            parallel: false,
            error: None,
        }
    }
}

/// One restart's hyperparameters and score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub index: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    /// Infinite when the restart hit an invalid value.
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct Exploration {
    pub chain: Chain,
    pub best: Candidate,
    /// Every restart in order, accepted or not.
    pub candidates: Vec<Candidate>,
}

/// Total error of `chain` over the samples.
pub fn score_chain(chain: &Chain, inputs: &[f64], targets: &[f64], error: fn(f64, f64) -> f64) -> Result<f64, CurveError> {
    inputs.iter().zip(targets).try_fold(0.0, |acc, (&x, &y)| {
        let predicted = chain.evaluate(x)?;
        Ok(acc + error(predicted, y))
    })
}

fn jittered(value: f64, u: f64, rate: f64) -> f64 {
    value * (1.0 + (u - 0.5) * rate)
}

/// Draw every restart's hyperparameters before any training runs, so the
/// plan depends only on the seed.
fn plan_restarts(base: &InductiveOptions, opts: &ExplorationOptions) -> Vec<Candidate> {
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..opts.refinement_epochs)
        .map(|index| {
            let lr_draw: f64 = rng.gen_range(0.0..1.0);
            let epoch_draw: f64 = rng.gen_range(0.0..1.0);
            Candidate {
                index,
                learning_rate: jittered(base.learning_rate, lr_draw, opts.exploration_rate),
                epochs: jittered(base.epochs as f64, epoch_draw, opts.exploration_rate) as usize,
                score: f64::INFINITY,
            }
        })
        .collect()
}

fn run_restart<F>(
    mut candidate: Candidate,
    total: usize,
    inputs: &[f64],
    targets: &[f64],
    base: &InductiveOptions,
    loss: &F,
    error: fn(f64, f64) -> f64,
) -> Result<(Candidate, Option<Chain>), CurveError>
where
    F: Fn(&mut Tape, NodeId, f64) -> Result<NodeId, CurveError>,
{
    let opts = InductiveOptions {
        learning_rate: candidate.learning_rate,
        epochs: candidate.epochs,
        ..*base
    };
    let trained = inductive_descent(total, inputs, targets, &opts, loss)
        .and_then(|chain| score_chain(&chain, inputs, targets, error).map(|score| (chain, score)));

    match trained {
        Ok((chain, score)) => {
            candidate.score = score;
            debug!(
                restart = candidate.index,
                learning_rate = candidate.learning_rate,
                epochs = candidate.epochs,
                score,
                "restart scored"
            );
            Ok((candidate, Some(chain)))
        }
        Err(err @ CurveError::InvalidValue { .. }) => {
            warn!(restart = candidate.index, error = %err, "restart discarded");
            Ok((candidate, None))
        }
        Err(err) => Err(err),
    }
}

/// Run `refinement_epochs` jittered restarts of [`inductive_descent`] and
/// keep the chain with the lowest total error.
///
/// `progress` receives `(restart_index, score)` whenever a restart becomes
/// the new best, in restart order regardless of `parallel`.
pub fn inductive_exploration<F, P>(
    total: usize,
    inputs: &[f64],
    targets: &[f64],
    base: &InductiveOptions,
    loss: &F,
    opts: &ExplorationOptions,
    mut progress: P,
) -> Result<Exploration, CurveError>
where
    F: Fn(&mut Tape, NodeId, f64) -> Result<NodeId, CurveError> + Sync,
    P: FnMut(usize, f64),
{
    validate_samples(total, inputs, targets)?;
    let error = opts.error.unwrap_or(squared_error_score);
    let plan = plan_restarts(base, opts);

    let results: Vec<(Candidate, Option<Chain>)> = if opts.parallel {
        plan.into_par_iter()
            .map(|candidate| run_restart(candidate, total, inputs, targets, base, loss, error))
            .collect::<Result<_, _>>()?
    } else {
        plan.into_iter()
            .map(|candidate| run_restart(candidate, total, inputs, targets, base, loss, error))
            .collect::<Result<_, _>>()?
    };

    let mut best: Option<(Candidate, Chain)> = None;
    let mut best_score = f64::MAX;
    let mut candidates = Vec::with_capacity(results.len());

    for (candidate, chain) in results {
        candidates.push(candidate);
        let Some(chain) = chain else { continue };
        if !(candidate.score < best_score) {
            continue;
        }
        best_score = candidate.score;
        info!(restart = candidate.index, score = candidate.score, "new best chain");
        progress(candidate.index, candidate.score);
        best = Some((candidate, chain));
    }

    let (best, chain) = best.ok_or(CurveError::NoCandidate {
        restarts: opts.refinement_epochs,
    })?;
    Ok(Exploration { chain, best, candidates })
}
