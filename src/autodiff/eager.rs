//! Plain `f64` evaluation with no graph.

use crate::autodiff::{checked, Backend, DISCRIMINANT_EPSILON};
use crate::error::CurveError;

/// Evaluates the curve math directly on `f64`s.
///
/// Used wherever only the forward value is needed (scoring, plotting, residuals).
#[derive(Debug, Clone, Copy, Default)]
pub struct Eager;

impl Backend for Eager {
    type Value = f64;

    fn leaf(&mut self, value: f64) -> Result<f64, CurveError> {
        checked(value, "leaf")
    }

    fn value(&self, v: f64) -> f64 {
        v
    }

    fn add(&mut self, a: f64, b: f64) -> Result<f64, CurveError> {
        checked(a + b, "add")
    }

    fn sub(&mut self, a: f64, b: f64) -> Result<f64, CurveError> {
        checked(a - b, "sub")
    }

    fn mul(&mut self, a: f64, b: f64) -> Result<f64, CurveError> {
        checked(a * b, "mul")
    }

    fn div(&mut self, a: f64, b: f64) -> Result<f64, CurveError> {
        checked(a / b, "div")
    }

    fn neg(&mut self, a: f64) -> Result<f64, CurveError> {
        checked(-a, "neg")
    }

    fn sin(&mut self, a: f64) -> Result<f64, CurveError> {
        checked(a.sin(), "sin")
    }

    fn cos(&mut self, a: f64) -> Result<f64, CurveError> {
        checked(a.cos(), "cos")
    }

    fn tan(&mut self, a: f64) -> Result<f64, CurveError> {
        checked(a.tan(), "tan")
    }

    fn sqrt(&mut self, a: f64) -> Result<f64, CurveError> {
        checked(a.sqrt(), "sqrt")
    }

    fn square(&mut self, a: f64) -> Result<f64, CurveError> {
        checked(a * a, "square")
    }

    fn guard_discriminant(&mut self, d: f64) -> Result<f64, CurveError> {
        if d < 0.0 { Ok(DISCRIMINANT_EPSILON) } else { Ok(d) }
    }
}
