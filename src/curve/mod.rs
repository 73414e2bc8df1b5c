//! Piecewise curve model: single arcs and chains of arcs.

pub mod chain;
pub mod segment;

pub use chain::{domain_length_with, evaluate_with, Boundary, Chain};
pub use segment::{CurvatureSeed, ParamGrad, Segment, SegmentVars, StepScales};
