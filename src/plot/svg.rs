//! SVG chart export via Plotters.
//!
//! Draws the fitted curve as a line and the observed samples as small
//! circles on a white background.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::error::AppError;

pub const SVG_SIZE: (u32, u32) = (800, 600);

/// Write `curve` and `samples` to an SVG file at `path`.
pub fn write_svg_plot(path: &Path, samples: &[(f64, f64)], curve: &[(f64, f64)], title: &str) -> Result<(), AppError> {
    let (x0, x1, y0, y1) = bounds(samples, curve)
        .ok_or_else(|| AppError::new(4, "Nothing finite to plot."))?;
    draw(path, samples, curve, title, (x0..x1, y0..y1))
        .map_err(|e| AppError::new(2, format!("Failed to write SVG '{}': {e}", path.display())))
}

type Ranges = (std::ops::Range<f64>, std::ops::Range<f64>);

fn draw(
    path: &Path,
    samples: &[(f64, f64)],
    curve: &[(f64, f64)],
    title: &str,
    (x_range, y_range): Ranges,
) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, SVG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("x")
        .y_desc("y")
        .x_labels(8)
        .y_labels(8)
        .draw()?;

    let curve_color = RGBColor(0, 90, 200);
    let sample_color = RGBColor(220, 60, 30);

    chart.draw_series(LineSeries::new(
        curve.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()),
        curve_color.stroke_width(2),
    ))?;
    chart.draw_series(
        samples
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, sample_color.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn bounds(samples: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64, f64, f64)> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &(x, y) in samples.iter().chain(curve) {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !(x_min.is_finite() && y_min.is_finite()) {
        return None;
    }
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    let pad = ((y_max - y_min) * 0.05).max(1e-6);
    Some((x_min, x_max, y_min - pad, y_max + pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_the_y_axis() {
        let (x0, x1, y0, y1) = bounds(&[(0.0, 0.0)], &[(2.0, 1.0), (f64::NAN, 5.0)]).unwrap();
        assert_eq!((x0, x1), (0.0, 2.0));
        assert!(y0 < 0.0 && y1 > 1.0 && y1 < 5.0);
        assert!(bounds(&[], &[]).is_none());
    }

    #[test]
    fn writes_an_svg_file() {
        let path = std::env::temp_dir().join(format!("paracurve-plot-{}.svg", std::process::id()));
        let curve: Vec<(f64, f64)> = (0..20).map(|i| (i as f64 * 0.1, (i as f64 * 0.1).sin())).collect();
        write_svg_plot(&path, &[(0.0, 0.0), (1.0, 0.8)], &curve, "sin(x)").unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<circle"));
    }
}
