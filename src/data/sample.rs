//! Synthetic sample generation from a known target function.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::RunConfig;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleData {
    /// Evenly spaced, strictly increasing x-values.
    pub inputs: Vec<f64>,
    /// Observed (noisy) targets.
    pub targets: Vec<f64>,
    /// Noise-free target values.
    pub clean: Vec<f64>,
}

impl SampleData {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Observed samples as `(x, y)` pairs.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.inputs.iter().copied().zip(self.targets.iter().copied()).collect()
    }
}

pub fn generate_sample(config: &RunConfig) -> Result<SampleData, AppError> {
    if config.sample_count < 2 {
        return Err(AppError::new(2, "Sample count must be >= 2."));
    }
    if !(config.x_min.is_finite() && config.x_max.is_finite() && config.x_max > config.x_min) {
        return Err(AppError::new(2, "Invalid x range for sample generation."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Noise sigma must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let n = config.sample_count;
    let step = (config.x_max - config.x_min) / (n as f64 - 1.0);

    let mut inputs = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);
    let mut clean = Vec::with_capacity(n);

    for i in 0..n {
        let x = config.x_min + step * i as f64;
        let y = config.target.eval(x);
        let noise = if config.noise > 0.0 {
            config.noise * normal.sample(&mut rng)
        } else {
            0.0
        };
        inputs.push(x);
        clean.push(y);
        targets.push(y + noise);
    }

    Ok(SampleData { inputs, targets, clean })
}

fn sample_seed(config: &RunConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.target.hash(&mut hasher);
    config.sample_count.hash(&mut hasher);
    config.x_min.to_bits().hash(&mut hasher);
    config.x_max.to_bits().hash(&mut hasher);
    config.noise.to_bits().hash(&mut hasher);
    hasher.finish()
}
