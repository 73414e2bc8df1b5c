//! A single curve arc (a "paravector").
//!
//! A segment is described by three parameters:
//!
//! - `length` (α): chord length, always positive
//! - `angle` (θ): chord rotation, kept inside `(-π/2, π/2)` so the segment moves
//!   strictly to the right
//! - `curvature` (β): bend of the arc around its chord
//!
//! In segment-local coordinates the arc is the parabola
//!
//! ```text
//! local_y(t) = (tan(-β) / α) · t · (t - α)
//! ```
//!
//! through `(0, 0)` and `(α, 0)`, rotated by θ and translated to an anchor
//! `(h, k)`. Evaluating the curve at a global `x` means inverting that rotation,
//! which is a quadratic in the local coordinate.

use std::f64::consts::{FRAC_PI_2, PI};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::autodiff::{Backend, Eager, NodeId, Tape};
use crate::error::CurveError;

/// `|sin θ|` below this is treated as an unrotated segment.
const ROTATION_CUTOFF: f64 = 1e-8;

/// `|tan(-β)/α|` below this is treated as a straight segment.
const CURVATURE_CUTOFF: f64 = 1e-8;

/// Safety margin used when clamping parameters after an update.
pub const PARAM_MARGIN: f64 = 0.01;

/// Curvature used by [`CurvatureSeed::NearStraight`].
///
/// Large enough that the slope stays above [`CURVATURE_CUTOFF`], so the
/// curvature still receives gradient through the quadratic solve.
pub const NEAR_STRAIGHT_CURVATURE: f64 = 1e-3;

/// How a freshly constructed segment picks its initial curvature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CurvatureSeed {
    /// Start as (almost) a straight chord.
    NearStraight,
    /// Start at `0.5 · (π/2 − θ)`, half way between the chord and vertical.
    Bisector,
}

impl CurvatureSeed {
    pub fn curvature(self, angle: f64) -> f64 {
        match self {
            CurvatureSeed::NearStraight => NEAR_STRAIGHT_CURVATURE,
            CurvatureSeed::Bisector => 0.5 * (FRAC_PI_2 - angle),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CurvatureSeed::NearStraight => "near-straight",
            CurvatureSeed::Bisector => "bisector",
        }
    }
}

/// Per-parameter multipliers applied on top of the learning rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepScales {
    pub length: f64,
    pub angle: f64,
    pub curvature: f64,
}

impl StepScales {
    /// Defaults for joint batch descent.
    pub const BATCH: StepScales = StepScales {
        length: 1.0,
        angle: 1.0,
        curvature: 3.0,
    };

    /// Defaults for inductive (per-segment) descent.
    pub const INDUCTIVE: StepScales = StepScales {
        length: 1.0,
        angle: 1.0,
        curvature: 0.01,
    };
}

/// Accumulated loss gradient with respect to each parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParamGrad {
    pub length: f64,
    pub angle: f64,
    pub curvature: f64,
}

/// One arc of a piecewise curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub length: f64,
    pub angle: f64,
    pub curvature: f64,
    grad: ParamGrad,
}

/// A segment's parameters bound into a [`Backend`].
#[derive(Debug, Clone, Copy)]
pub struct SegmentVars<V> {
    pub length: V,
    pub angle: V,
    pub curvature: V,
}

impl Segment {
    pub fn new(length: f64, angle: f64, curvature: f64) -> Self {
        Self {
            length,
            angle,
            curvature,
            grad: ParamGrad::default(),
        }
    }

    /// Segment whose chord is the vector `(dx, dy)`.
    pub fn from_vector(dx: f64, dy: f64, seed: CurvatureSeed) -> Self {
        let length = dx.hypot(dy);
        let angle = dy.atan2(dx);
        let mut segment = Self::new(length, angle, seed.curvature(angle));
        segment.clamp();
        segment
    }

    /// Segment whose chord runs from `(x1, y1)` to `(x2, y2)`.
    pub fn from_vector_difference(x1: f64, y1: f64, x2: f64, y2: f64, seed: CurvatureSeed) -> Self {
        Self::from_vector(x2 - x1, y2 - y1, seed)
    }

    /// Horizontal extent covered by this segment.
    pub fn x_span(&self) -> f64 {
        self.length * self.angle.cos()
    }

    /// Vertical rise from start to end.
    pub fn y_span(&self) -> f64 {
        self.length * self.angle.sin()
    }

    /// Far endpoint when anchored at `(h, k)`.
    pub fn end_point(&self, h: f64, k: f64) -> (f64, f64) {
        (h + self.x_span(), k + self.y_span())
    }

    pub fn grad(&self) -> ParamGrad {
        self.grad
    }

    pub fn bind<B: Backend>(&self, backend: &mut B) -> Result<SegmentVars<B::Value>, CurveError> {
        Ok(SegmentVars {
            length: backend.leaf(self.length)?,
            angle: backend.leaf(self.angle)?,
            curvature: backend.leaf(self.curvature)?,
        })
    }

    /// Curve height at global `x` for anchor `(h, k)`.
    pub fn evaluate(&self, x: f64, h: f64, k: f64) -> Result<f64, CurveError> {
        let mut backend = Eager;
        let vars = self.bind(&mut backend)?;
        vars.global_x(&mut backend, x, h, k)
    }

    /// Local parabola height at chord coordinate `t`.
    pub fn local_y(&self, t: f64) -> Result<f64, CurveError> {
        let mut backend = Eager;
        let vars = self.bind(&mut backend)?;
        vars.local_y(&mut backend, t)
    }

    /// Add the gradients a backward pass left on `vars` into this segment.
    pub fn accumulate_grad(&mut self, tape: &Tape, vars: &SegmentVars<NodeId>) {
        self.grad.length += tape.grad(vars.length);
        self.grad.angle += tape.grad(vars.angle);
        self.grad.curvature += tape.grad(vars.curvature);
    }

    /// One gradient-descent step, then clamp and clear the gradients.
    pub fn step(&mut self, learning_rate: f64, scales: StepScales) {
        self.length -= scales.length * learning_rate * self.grad.length;
        self.angle -= scales.angle * learning_rate * self.grad.angle;
        self.curvature -= scales.curvature * learning_rate * self.grad.curvature;
        self.clamp();
        self.zero_grad();
    }

    /// Force the parameters back into the region where the segment is valid.
    ///
    /// Keeps `length > 0`, `|angle| ≤ π/2 − margin` (so `x_span > 0`) and
    /// `angle + curvature ≤ π`.
    pub fn clamp(&mut self) {
        if self.length <= 0.0 {
            self.length = PARAM_MARGIN;
        }
        let limit = FRAC_PI_2 - PARAM_MARGIN;
        self.angle = self.angle.clamp(-limit, limit);
        if self.angle + self.curvature > PI {
            self.curvature = PI - self.angle;
        }
    }

    pub fn zero_grad(&mut self) {
        self.grad = ParamGrad::default();
    }
}

impl<V: Copy> SegmentVars<V> {
    /// `tan(-β) / α`
    fn slope<B: Backend<Value = V>>(&self, b: &mut B) -> Result<V, CurveError> {
        let neg = b.neg(self.curvature)?;
        let tan = b.tan(neg)?;
        b.div(tan, self.length)
    }

    pub fn local_y<B: Backend<Value = V>>(&self, b: &mut B, t: V) -> Result<V, CurveError> {
        let slope = self.slope(b)?;
        let shifted = b.sub(t, self.length)?;
        let scaled = b.mul(slope, t)?;
        b.mul(scaled, shifted)
    }

    pub fn x_span<B: Backend<Value = V>>(&self, b: &mut B) -> Result<V, CurveError> {
        let cos = b.cos(self.angle)?;
        b.mul(self.length, cos)
    }

    pub fn end_point<B: Backend<Value = V>>(&self, b: &mut B, h: V, k: V) -> Result<(V, V), CurveError> {
        let run = self.x_span(b)?;
        let sin = b.sin(self.angle)?;
        let rise = b.mul(self.length, sin)?;
        Ok((b.add(h, run)?, b.add(k, rise)?))
    }

    /// Curve height at global `x` for anchor `(h, k)`.
    pub fn global_x<B: Backend<Value = V>>(&self, b: &mut B, x: V, h: V, k: V) -> Result<V, CurveError> {
        let sin = b.sin(self.angle)?;
        let cos = b.cos(self.angle)?;
        let c = b.sub(x, h)?;

        // Unrotated: the local parabola is already in global orientation.
        if b.value(sin).abs() < ROTATION_CUTOFF {
            let y = self.local_y(b, c)?;
            return b.add(k, y);
        }

        let m = self.slope(b)?;
        if b.value(m).abs() < CURVATURE_CUTOFF {
            let along = b.div(c, cos)?;
            let rise = b.mul(along, sin)?;
            return b.add(k, rise);
        }

        // a·t² + b·t + c = 0 with a = m·sin θ, b = −(cos θ + m·α·sin θ).
        let qa = b.mul(m, sin)?;
        let m_len = b.mul(m, self.length)?;
        let bend = b.mul(m_len, sin)?;
        let sum = b.add(cos, bend)?;
        let qb = b.neg(sum)?;

        let four = b.leaf(4.0)?;
        let qb2 = b.square(qb)?;
        let ac = b.mul(qa, c)?;
        let four_ac = b.mul(four, ac)?;
        let discriminant = b.sub(qb2, four_ac)?;
        let discriminant = b.guard_discriminant(discriminant)?;

        let root = b.sqrt(discriminant)?;
        let neg_b = b.neg(qb)?;
        let numerator = b.sub(neg_b, root)?;
        let two = b.leaf(2.0)?;
        let denominator = b.mul(two, qa)?;
        let t = b.div(numerator, denominator)?;

        let local = self.local_y(b, t)?;
        let rise = b.mul(t, sin)?;
        let lift = b.mul(local, cos)?;
        let y = b.add(k, rise)?;
        b.add(y, lift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn unrotated_straight_segment_is_flat() {
        let segment = Segment::new(2.0, 0.0, 0.0);
        for &x in &[0.0, 0.5, 1.0, 1.9] {
            assert_abs_diff_eq!(segment.evaluate(x, 0.0, 0.0).unwrap(), 0.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(segment.evaluate(1.0, 0.0, 3.0).unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn unrotated_curved_segment_follows_local_parabola() {
        let segment = Segment::new(2.0, 0.0, 0.5);
        let expected = (-0.5f64).tan() / 2.0 * 1.0 * (1.0 - 2.0);
        assert_abs_diff_eq!(segment.evaluate(1.0, 0.0, 0.0).unwrap(), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(segment.local_y(1.0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn straight_rotated_segment_is_linear() {
        let angle = PI / 6.0;
        let segment = Segment::new(2.0, angle, 0.0);
        let y = segment.evaluate(1.0, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(y, angle.tan(), epsilon = 1e-12);
        let shifted = segment.evaluate(2.0, 1.0, 0.5).unwrap();
        assert_abs_diff_eq!(shifted, 0.5 + angle.tan(), epsilon = 1e-12);
    }

    #[test]
    fn curved_segment_passes_through_both_endpoints() {
        for &curvature in &[0.3, -0.3] {
            let segment = Segment::new(1.5, 0.4, curvature);
            let (h, k) = (0.25, -1.0);
            assert_abs_diff_eq!(segment.evaluate(h, h, k).unwrap(), k, epsilon = 1e-9);

            let (end_x, end_y) = segment.end_point(h, k);
            assert_abs_diff_eq!(segment.evaluate(end_x, h, k).unwrap(), end_y, epsilon = 1e-9);
        }
    }

    #[test]
    fn curvature_bends_the_arc_off_its_chord() {
        // Positive curvature lifts the arc above the chord.
        let segment = Segment::new(1.5, 0.4, 0.3);
        let mid_x = 0.5 * segment.x_span();
        let chord = 0.5 * segment.y_span();
        assert!(segment.evaluate(mid_x, 0.0, 0.0).unwrap() > chord);

        let flipped = Segment::new(1.5, 0.4, -0.3);
        assert!(flipped.evaluate(mid_x, 0.0, 0.0).unwrap() < chord);
    }

    #[test]
    fn negative_discriminant_still_yields_a_training_signal() {
        let segment = Segment::new(1.5, 0.4, -0.3);
        let y = segment.evaluate(5.0, 0.0, 0.0).unwrap();
        assert!(y.is_finite());

        let mut tape = Tape::new();
        let vars = segment.bind(&mut tape).unwrap();
        let x = tape.leaf(5.0).unwrap();
        let origin = tape.leaf(0.0).unwrap();
        let out = vars.global_x(&mut tape, x, origin, origin).unwrap();
        assert_eq!(tape.value(out), y);

        tape.backward(out, 1.0);
        let mut trained = segment.clone();
        trained.accumulate_grad(&tape, &vars);
        let grad = trained.grad();
        assert!(grad.length.is_finite() && grad.angle.is_finite() && grad.curvature.is_finite());
        assert!(grad.curvature != 0.0);
    }

    #[test]
    fn parameter_gradients_match_finite_differences() {
        let base = Segment::new(1.5, 0.4, 0.3);
        let (x, h, k) = (0.7, 0.1, 0.2);

        let mut tape = Tape::new();
        let vars = base.bind(&mut tape).unwrap();
        let xv = tape.leaf(x).unwrap();
        let hv = tape.leaf(h).unwrap();
        let kv = tape.leaf(k).unwrap();
        let out = vars.global_x(&mut tape, xv, hv, kv).unwrap();
        tape.backward(out, 1.0);

        let eps = 1e-6;
        let numeric = |perturb: fn(&mut Segment, f64)| {
            let mut plus = base.clone();
            perturb(&mut plus, eps);
            let mut minus = base.clone();
            perturb(&mut minus, -eps);
            (plus.evaluate(x, h, k).unwrap() - minus.evaluate(x, h, k).unwrap()) / (2.0 * eps)
        };

        assert_abs_diff_eq!(tape.grad(vars.length), numeric(|s, d| s.length += d), epsilon = 1e-4);
        assert_abs_diff_eq!(tape.grad(vars.angle), numeric(|s, d| s.angle += d), epsilon = 1e-4);
        assert_abs_diff_eq!(
            tape.grad(vars.curvature),
            numeric(|s, d| s.curvature += d),
            epsilon = 1e-4
        );
        assert_abs_diff_eq!(tape.grad(kv), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn from_vector_difference_seeds() {
        let straight = Segment::from_vector_difference(1.0, 1.0, 4.0, 5.0, CurvatureSeed::NearStraight);
        assert_abs_diff_eq!(straight.length, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(straight.angle, 4.0f64.atan2(3.0), epsilon = 1e-12);
        assert_eq!(straight.curvature, NEAR_STRAIGHT_CURVATURE);
        assert_abs_diff_eq!(straight.x_span(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(straight.y_span(), 4.0, epsilon = 1e-12);

        let bisector = Segment::from_vector_difference(1.0, 1.0, 4.0, 5.0, CurvatureSeed::Bisector);
        assert_abs_diff_eq!(bisector.curvature, 0.5 * (FRAC_PI_2 - bisector.angle), epsilon = 1e-12);
    }

    #[test]
    fn clamp_restores_invariants() {
        let mut segment = Segment::new(-1.0, 2.0, 3.0);
        segment.clamp();
        assert_eq!(segment.length, PARAM_MARGIN);
        assert_abs_diff_eq!(segment.angle, FRAC_PI_2 - PARAM_MARGIN, epsilon = 1e-12);
        assert!(segment.angle + segment.curvature <= PI + 1e-12);
        assert!(segment.x_span() > 0.0);

        let mut steep = Segment::new(1.0, -2.0, 0.0);
        steep.clamp();
        assert_abs_diff_eq!(steep.angle, -(FRAC_PI_2 - PARAM_MARGIN), epsilon = 1e-12);
    }

    #[test]
    fn step_applies_scaled_gradients_and_clears_them() {
        let mut segment = Segment::new(1.0, 0.2, 0.1);
        let mut tape = Tape::new();
        let vars = segment.bind(&mut tape).unwrap();
        // loss = α + θ + β, every gradient is 1.
        let sum = tape.add(vars.length, vars.angle).unwrap();
        let loss = tape.add(sum, vars.curvature).unwrap();
        tape.backward(loss, 1.0);
        segment.accumulate_grad(&tape, &vars);
        assert_eq!(
            segment.grad(),
            ParamGrad {
                length: 1.0,
                angle: 1.0,
                curvature: 1.0
            }
        );

        segment.step(0.1, StepScales::BATCH);
        assert_abs_diff_eq!(segment.length, 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(segment.angle, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(segment.curvature, -0.2, epsilon = 1e-12);
        assert_eq!(segment.grad(), ParamGrad::default());
    }
}
