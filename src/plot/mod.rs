//! Chart rendering for fitted chains.
//!
//! - fixed-size terminal plot (`ascii`)
//! - SVG image export (`svg`)
//!
//! Both renderers work on plain `(x, y)` series. A chain is turned into one
//! with [`sample_chain`], which only needs the chain's domain and `evaluate`.

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

use crate::curve::Chain;
use crate::error::CurveError;

/// Evaluate `chain` at `n` evenly spaced points across its domain.
pub fn sample_chain(chain: &Chain, n: usize) -> Result<Vec<(f64, f64)>, CurveError> {
    let n = n.max(2);
    let (start, _) = chain.domain();
    let length = chain.domain_length();
    (0..n)
        .map(|i| {
            let x = start + length * i as f64 / (n as f64 - 1.0);
            Ok((x, chain.evaluate(x)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Segment;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sample_chain_spans_the_domain() {
        let chain = Chain::new(vec![Segment::new(2.0, 0.0, 0.0)]).with_origin(1.0, 3.0);
        let points = sample_chain(&chain, 5).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], (1.0, 3.0));
        assert_abs_diff_eq!(points[4].0, 3.0, epsilon = 1e-12);
        assert!(points.iter().all(|&(_, y)| (y - 3.0).abs() < 1e-12));
    }
}
