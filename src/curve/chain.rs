//! Ordered sequences of segments forming one continuous curve.
//!
//! Segment `i` covers the half-open x-interval `[start_i, end_i)` where the
//! boundaries are the prefix sums of the segments' horizontal spans, starting
//! at the chain origin. Evaluation walks the segments left to right and
//! anchors each one at the *evaluated* endpoint of its predecessor.
//!
//! The composed curve is continuous at a boundary only when the next segment
//! passes through its own anchor, i.e. when `cos θ + m·length·sin θ > 0` with
//! `m = tan(−curvature)/length`. Steep, strongly curved segments that the clamp
//! still allows break this and the curve jumps at their start.

use crate::autodiff::{Backend, Eager, NodeId, Tape};
use crate::curve::segment::{Segment, SegmentVars, StepScales};
use crate::error::CurveError;

/// The x-interval owned by one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub start: f64,
    pub end: f64,
    pub index: usize,
}

impl Boundary {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.start && x < self.end
    }
}

/// A piecewise curve of [`Segment`]s anchored at `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    segments: Vec<Segment>,
    origin: (f64, f64),
}

impl Chain {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            origin: (0.0, 0.0),
        }
    }

    /// Anchor the first segment at `(h, k)` instead of the origin.
    pub fn with_origin(mut self, h: f64, k: f64) -> Self {
        self.origin = (h, k);
        self
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total horizontal extent: the sum of every segment's span.
    pub fn domain_length(&self) -> f64 {
        self.segments.iter().map(Segment::x_span).sum()
    }

    /// `(start, end)` of the covered x-range, starting at the origin.
    pub fn domain(&self) -> (f64, f64) {
        let start = self.origin.0;
        (start, start + self.domain_length())
    }

    /// Per-segment intervals, walking the chain once from offset `h`.
    pub fn setup_boundaries(&self, h: f64) -> Vec<Boundary> {
        let mut current = h;
        self.segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                let end = current + segment.x_span();
                let boundary = Boundary {
                    start: current,
                    end,
                    index,
                };
                current = end;
                boundary
            })
            .collect()
    }

    /// Index of the segment owning `x`.
    ///
    /// The first interval containing `x` wins. Anything not covered (the
    /// domain end itself included) falls back to the final segment. `None`
    /// only for an empty chain.
    pub fn relevant_index(&self, x: f64, boundaries: &[Boundary]) -> Option<usize> {
        boundaries
            .iter()
            .find(|b| b.contains(x))
            .map(|b| b.index)
            .or_else(|| self.segments.len().checked_sub(1))
    }

    pub fn relevant_segment(&self, x: f64, boundaries: &[Boundary]) -> Option<&Segment> {
        self.relevant_index(x, boundaries).map(|i| &self.segments[i])
    }

    /// Curve height at `x`, anchored at the chain origin.
    pub fn evaluate(&self, x: f64) -> Result<f64, CurveError> {
        let (h, k) = self.origin;
        self.evaluate_from(x, h, k)
    }

    /// Curve height at `x` with the first segment anchored at `(h, k)`.
    pub fn evaluate_from(&self, x: f64, h: f64, k: f64) -> Result<f64, CurveError> {
        let mut backend = Eager;
        let vars = self.bind(&mut backend)?;
        evaluate_with(&mut backend, &vars, x, h, k)
    }

    /// Like [`Chain::evaluate`], but rejects `x` outside `[start, end]`.
    ///
    /// The upper edge is inclusive and evaluates on the final segment.
    pub fn evaluate_strict(&self, x: f64) -> Result<f64, CurveError> {
        let (start, end) = self.domain();
        if !(x >= start && x <= end) {
            return Err(CurveError::DomainExceeded { x, start, end });
        }
        self.evaluate(x)
    }

    pub fn bind<B: Backend>(&self, backend: &mut B) -> Result<Vec<SegmentVars<B::Value>>, CurveError> {
        self.segments.iter().map(|s| s.bind(backend)).collect()
    }

    pub fn accumulate_grad(&mut self, tape: &Tape, vars: &[SegmentVars<NodeId>]) {
        for (segment, vars) in self.segments.iter_mut().zip(vars) {
            segment.accumulate_grad(tape, vars);
        }
    }

    /// Gradient step on every segment.
    ///
    /// Segment `j` of `n` uses `learning_rate · (1 − decay · j/n)`: later
    /// segments move more slowly because their error compounds every upstream
    /// segment's.
    pub fn step(&mut self, learning_rate: f64, scales: StepScales, decay: f64) {
        let total = self.segments.len() as f64;
        for (j, segment) in self.segments.iter_mut().enumerate() {
            let rate = learning_rate * (1.0 - decay * j as f64 / total);
            segment.step(rate, scales);
        }
    }

    pub fn zero_grad(&mut self) {
        for segment in &mut self.segments {
            segment.zero_grad();
        }
    }
}

/// Evaluate bound chain parameters at `x`, first segment anchored at `(h, k)`.
pub fn evaluate_with<B: Backend>(
    b: &mut B,
    vars: &[SegmentVars<B::Value>],
    x: B::Value,
    h: B::Value,
    k: B::Value,
) -> Result<B::Value, CurveError> {
    let Some((last, upstream)) = vars.split_last() else {
        return Err(CurveError::InvalidInput("cannot evaluate an empty chain".to_string()));
    };

    let target = b.value(x);
    let (mut h, mut k) = (h, k);

    for segment in upstream {
        let span = segment.x_span(b)?;
        let next_h = b.add(h, span)?;
        if target >= b.value(h) && target < b.value(next_h) {
            return segment.global_x(b, x, h, k);
        }
        k = segment.global_x(b, next_h, h, k)?;
        h = next_h;
    }

    last.global_x(b, x, h, k)
}

/// Total horizontal extent of bound chain parameters.
pub fn domain_length_with<B: Backend>(b: &mut B, vars: &[SegmentVars<B::Value>]) -> Result<B::Value, CurveError> {
    let mut total = b.leaf(0.0)?;
    for segment in vars {
        let span = segment.x_span(b)?;
        total = b.add(total, span)?;
    }
    Ok(total)
}
