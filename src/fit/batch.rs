//! Joint gradient descent over every segment of a chain.

use tracing::{debug, info};

use crate::autodiff::{Backend, NodeId, Tape};
use crate::curve::{domain_length_with, evaluate_with, Chain, CurvatureSeed, Segment, StepScales};
use crate::error::CurveError;
use crate::fit::validate_samples;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub learning_rate: f64,
    pub max_epochs: usize,
    pub scales: StepScales,
    /// Learning rate of segment `j` of `n` is scaled by `1 − decay · j/n`.
    pub position_decay: f64,
    /// Stop once an epoch's total loss drops below this.
    pub loss_epsilon: f64,
    /// Weight of the per-epoch `(L − L0)²` domain-length regularizer.
    pub length_weight: f64,
    pub curvature_seed: CurvatureSeed,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            max_epochs: 1000,
            scales: StepScales::BATCH,
            position_decay: 0.5,
            loss_epsilon: 1e-2,
            length_weight: 0.1,
            curvature_seed: CurvatureSeed::Bisector,
        }
    }
}

/// Seed `total` segments from evenly spaced sample ranges.
///
/// Range `i` runs from sample `i·n/total` to `(i+1)·n/total` (clamped to the
/// last sample); each segment starts as the chord between the two. Callers
/// validate the samples first.
pub(crate) fn seed_chain(total: usize, inputs: &[f64], targets: &[f64], seed: CurvatureSeed) -> Chain {
    let n = inputs.len();
    let segments = (0..total)
        .map(|i| {
            let start = i * n / total;
            let end = ((i + 1) * n / total).min(n - 1);
            Segment::from_vector_difference(inputs[start], targets[start], inputs[end], targets[end], seed)
        })
        .collect();
    Chain::new(segments).with_origin(inputs[0], targets[0])
}

/// Fit a chain of `total` segments to the samples by per-sample descent.
///
/// `loss` builds the pointwise training loss on the tape (see
/// [`squared_error`](crate::fit::squared_error)). `progress` receives
/// `(epoch, total_loss)` after every epoch. Reaching `max_epochs` without
/// converging is not an error.
pub fn fit<F, P>(
    total: usize,
    inputs: &[f64],
    targets: &[f64],
    opts: &BatchOptions,
    loss: &F,
    mut progress: P,
) -> Result<Chain, CurveError>
where
    F: Fn(&mut Tape, NodeId, f64) -> Result<NodeId, CurveError>,
    P: FnMut(usize, f64),
{
    validate_samples(total, inputs, targets)?;

    let mut chain = seed_chain(total, inputs, targets, opts.curvature_seed);
    let original_length = chain.domain_length();
    let (h, k) = chain.origin();
    let mut tape = Tape::new();
    let mut last_loss = f64::INFINITY;

    for epoch in 0..opts.max_epochs {
        let mut total_loss = 0.0;

        for (&x, &y) in inputs.iter().zip(targets) {
            tape.clear();
            let vars = chain.bind(&mut tape)?;
            let xv = tape.leaf(x)?;
            let hv = tape.leaf(h)?;
            let kv = tape.leaf(k)?;
            let output = evaluate_with(&mut tape, &vars, xv, hv, kv)?;
            let sample_loss = loss(&mut tape, output, y)?;

            tape.backward(sample_loss, 1.0);
            total_loss += tape.value(sample_loss);
            chain.accumulate_grad(&tape, &vars);
            chain.step(opts.learning_rate, opts.scales, opts.position_decay);
        }

        tape.clear();
        let vars = chain.bind(&mut tape)?;
        let current = domain_length_with(&mut tape, &vars)?;
        let reference = tape.leaf(original_length)?;
        let diff = tape.sub(current, reference)?;
        let squared = tape.square(diff)?;
        let weight = tape.leaf(opts.length_weight)?;
        let penalty = tape.mul(squared, weight)?;

        tape.backward(penalty, 1.0);
        total_loss += tape.value(penalty);
        chain.accumulate_grad(&tape, &vars);
        chain.step(opts.learning_rate, opts.scales, opts.position_decay);

        debug!(epoch, loss = total_loss, "batch epoch");
        progress(epoch, total_loss);
        last_loss = total_loss;

        if total_loss < opts.loss_epsilon {
            info!(epoch, loss = total_loss, segments = total, "batch descent converged");
            return Ok(chain);
        }
    }

    info!(
        epochs = opts.max_epochs,
        loss = last_loss,
        segments = total,
        "batch descent finished without converging"
    );
    Ok(chain)
}
