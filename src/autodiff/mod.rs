//! Reverse-mode automatic differentiation over scalar nodes.
//!
//! The curve math is written once against the [`Backend`] trait and runs on
//! either of two execution contexts:
//!
//! - [`Tape`]: records every operation as a node in an arena so that
//!   [`Tape::backward`] can propagate gradients to the parameter leaves
//! - [`Eager`]: evaluates plain `f64`s with no graph (scoring, plotting)
//!
//! The context is always passed explicitly; there is no process-wide state.

pub mod eager;
pub mod tape;

pub use eager::Eager;
pub use tape::{NodeId, Op, Tape};

use crate::error::CurveError;

/// Denominator guard used by the division, tangent and square-root gradients.
///
/// This biases gradients very slightly near zero denominators instead of
/// letting them blow up.
pub const DENOM_EPSILON: f64 = f64::EPSILON;

/// Square-root input substituted for a negative discriminant.
pub const DISCRIMINANT_EPSILON: f64 = 1e-6;

/// Gradient multiplier routed back into a negative discriminant.
pub const DISCRIMINANT_PENALTY: f64 = 1.0;

/// Numeric operations the curve model is expressed in.
///
/// Every constructor fails with [`CurveError::InvalidValue`] when the result
/// would be NaN.
pub trait Backend {
    /// Handle to a value living in this context.
    type Value: Copy;

    /// Introduce a constant or trainable parameter.
    fn leaf(&mut self, value: f64) -> Result<Self::Value, CurveError>;

    /// Read the forward value.
    fn value(&self, v: Self::Value) -> f64;

    fn add(&mut self, a: Self::Value, b: Self::Value) -> Result<Self::Value, CurveError>;
    fn sub(&mut self, a: Self::Value, b: Self::Value) -> Result<Self::Value, CurveError>;
    fn mul(&mut self, a: Self::Value, b: Self::Value) -> Result<Self::Value, CurveError>;
    fn div(&mut self, a: Self::Value, b: Self::Value) -> Result<Self::Value, CurveError>;
    fn neg(&mut self, a: Self::Value) -> Result<Self::Value, CurveError>;
    fn sin(&mut self, a: Self::Value) -> Result<Self::Value, CurveError>;
    fn cos(&mut self, a: Self::Value) -> Result<Self::Value, CurveError>;
    fn tan(&mut self, a: Self::Value) -> Result<Self::Value, CurveError>;
    fn sqrt(&mut self, a: Self::Value) -> Result<Self::Value, CurveError>;
    fn square(&mut self, a: Self::Value) -> Result<Self::Value, CurveError>;

    /// Make a quadratic discriminant safe to take the square root of.
    ///
    /// Non-negative inputs pass through. A negative input is replaced by
    /// [`DISCRIMINANT_EPSILON`] in the forward pass; on a tape its gradient is
    /// routed back into the original discriminant scaled by
    /// [`DISCRIMINANT_PENALTY`].
    fn guard_discriminant(&mut self, d: Self::Value) -> Result<Self::Value, CurveError>;
}

pub(crate) fn checked(value: f64, op: &'static str) -> Result<f64, CurveError> {
    if value.is_nan() {
        Err(CurveError::InvalidValue { op })
    } else {
        Ok(value)
    }
}
