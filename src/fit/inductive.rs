//! Inductive descent: fit one segment at a time, right to left.
//!
//! Each segment is trained on its own slice of the samples, anchored at the
//! slice's first sample, while an endpoint penalty pulls its far end onto the
//! start of the segment already fitted to its right. The last segment's far
//! end is pinned to the final sample.

use tracing::{debug, info};

use crate::autodiff::{Backend, NodeId, Tape};
use crate::curve::{Chain, CurvatureSeed, Segment, StepScales};
use crate::error::CurveError;
use crate::fit::validate_samples;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InductiveOptions {
    pub learning_rate: f64,
    /// Epoch budget per segment.
    pub epochs: usize,
    pub loss_epsilon: f64,
    /// Weight of the squared distance between the segment end and its pin.
    pub endpoint_penalty: f64,
    pub scales: StepScales,
    pub curvature_seed: CurvatureSeed,
}

impl Default for InductiveOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epochs: 500,
            loss_epsilon: 0.01,
            endpoint_penalty: 0.1,
            scales: StepScales::INDUCTIVE,
            curvature_seed: CurvatureSeed::NearStraight,
        }
    }
}

/// Fit a single segment to `inputs`/`targets`, anchored at the first sample
/// with its far end pulled towards `fixed_end`.
pub fn fit_segment<F>(
    inputs: &[f64],
    targets: &[f64],
    fixed_end: (f64, f64),
    opts: &InductiveOptions,
    loss: &F,
) -> Result<Segment, CurveError>
where
    F: Fn(&mut Tape, NodeId, f64) -> Result<NodeId, CurveError>,
{
    let (Some(&start_x), Some(&start_y)) = (inputs.first(), targets.first()) else {
        return Err(CurveError::InvalidInput("segment fit needs at least one sample".to_string()));
    };
    let (end_x, end_y) = fixed_end;
    let mut segment = Segment::from_vector_difference(start_x, start_y, end_x, end_y, opts.curvature_seed);
    let mut tape = Tape::new();

    for epoch in 0..opts.epochs {
        tape.clear();
        let vars = segment.bind(&mut tape)?;
        let h = tape.leaf(start_x)?;
        let k = tape.leaf(start_y)?;

        let mut total = tape.leaf(0.0)?;
        for (&x, &y) in inputs.iter().zip(targets) {
            let xv = tape.leaf(x)?;
            let output = vars.global_x(&mut tape, xv, h, k)?;
            let sample_loss = loss(&mut tape, output, y)?;
            total = tape.add(total, sample_loss)?;
        }

        let (far_x, far_y) = vars.end_point(&mut tape, h, k)?;
        let pin_x = tape.leaf(end_x)?;
        let pin_y = tape.leaf(end_y)?;
        let dx = tape.sub(far_x, pin_x)?;
        let dy = tape.sub(far_y, pin_y)?;
        let dx2 = tape.square(dx)?;
        let dy2 = tape.square(dy)?;
        let distance = tape.add(dx2, dy2)?;
        let weight = tape.leaf(opts.endpoint_penalty)?;
        let endpoint_loss = tape.mul(weight, distance)?;
        let total = tape.add(total, endpoint_loss)?;

        tape.backward(total, 1.0);
        segment.accumulate_grad(&tape, &vars);
        segment.step(opts.learning_rate, opts.scales);

        let value = tape.value(total);
        if value < opts.loss_epsilon {
            debug!(epoch, loss = value, "segment converged");
            break;
        }
    }

    Ok(segment)
}

/// Sample range `[start, end)` used for segment `i` of `total` over `n` samples.
fn segment_range(i: usize, total: usize, n: usize) -> (usize, usize) {
    let end = n - 1 - (total - 1 - i) * n / total;
    let start = if i == 0 { 0 } else { n - 1 - (total - i) * n / total };
    (start, end)
}

/// Build a chain of `total` segments with [`fit_segment`], right to left.
///
/// The returned chain is anchored at the first sample.
pub fn inductive_descent<F>(
    total: usize,
    inputs: &[f64],
    targets: &[f64],
    opts: &InductiveOptions,
    loss: &F,
) -> Result<Chain, CurveError>
where
    F: Fn(&mut Tape, NodeId, f64) -> Result<NodeId, CurveError>,
{
    validate_samples(total, inputs, targets)?;
    let n = inputs.len();
    let mut fixed_end = (inputs[n - 1], targets[n - 1]);
    let mut segments = Vec::with_capacity(total);

    for i in (0..total).rev() {
        let (start, end) = segment_range(i, total, n);
        let segment = fit_segment(&inputs[start..end], &targets[start..end], fixed_end, opts, loss)?;
        debug!(
            segment = i,
            start,
            end,
            length = segment.length,
            angle = segment.angle,
            curvature = segment.curvature,
            "segment fitted"
        );
        segments.push(segment);
        fixed_end = (inputs[start], targets[start]);
    }

    segments.reverse();
    info!(
        segments = total,
        learning_rate = opts.learning_rate,
        epochs = opts.epochs,
        "inductive descent finished"
    );
    Ok(Chain::new(segments).with_origin(inputs[0], targets[0]))
}
