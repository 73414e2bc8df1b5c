//! `paracurve` library crate.
//!
//! Piecewise curve fitting with chains of parabolic arcs ("paravectors"),
//! trained by reverse-mode automatic differentiation.
//!
//! The binary (`para`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the curve model and trainers are reusable on their own

pub mod app;
pub mod autodiff;
pub mod cli;
pub mod curve;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod plot;
pub mod report;
