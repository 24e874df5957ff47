//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - bin contents: `o` at the bin center
//! - fitted curve: `-` line
//! - optional marker: `|` vertical line (e.g. the data NLL among toys)

use crate::domain::GaussParams;
use crate::hist::Histogram1D;
use crate::models::predict;

/// Render a histogram, optionally overlaid with a fitted Gaussian and a
/// vertical marker.
pub fn render_ascii_histogram(
    hist: &Histogram1D,
    fit: Option<&GaussParams>,
    marker: Option<f64>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let (x_min, x_max) = (hist.x_min(), hist.x_max());

    let points: Vec<(f64, f64)> = (0..hist.n_bins())
        .map(|i| (hist.bin_center(i), hist.bin_content(i)))
        .collect();
    let curve = fit.map(|p| sample_curve(p, x_min, x_max, width));

    // Counts start at zero; only the top of the range follows the data.
    let y_max = y_top(&points, curve.as_deref()).unwrap_or(1.0) * 1.05;
    let y_min = 0.0;

    let mut canvas = Canvas::new(width, height, (x_min, x_max), (y_min, y_max));

    // Curve first so the bin markers overwrite it.
    if let Some(curve) = &curve {
        canvas.polyline(curve, '-');
    }
    if let Some(x) = marker.filter(|x| (x_min..=x_max).contains(x)) {
        canvas.vertical(x, '|');
    }
    for &(x, y) in points.iter().filter(|&&(_, y)| y > 0.0) {
        canvas.put(x, y, 'o');
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {}=[{x_min:.3}, {x_max:.3}] | {}=[{y_min:.2}, {y_max:.2}]\n",
        axis_name(&hist.x_label, "x"),
        axis_name(&hist.y_label, "y"),
    ));
    for row in canvas.rows {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn axis_name<'a>(label: &'a str, fallback: &'a str) -> &'a str {
    if label.is_empty() { fallback } else { label }
}

fn sample_curve(params: &GaussParams, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let x = x_min + (x_max - x_min) * (i as f64 / (n as f64 - 1.0));
            (x, predict(params, x))
        })
        .collect()
}

fn y_top(points: &[(f64, f64)], curve: Option<&[(f64, f64)]>) -> Option<f64> {
    let max_y = points
        .iter()
        .chain(curve.unwrap_or(&[]))
        .map(|&(_, y)| y)
        .filter(|y| y.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    (max_y > 0.0).then_some(max_y)
}

/// Character grid with data coordinates; row 0 is the top.
struct Canvas {
    rows: Vec<Vec<char>>,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Canvas {
    fn new(width: usize, height: usize, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            rows: vec![vec![' '; width.max(2)]; height.max(2)],
            x_range,
            y_range,
        }
    }

    fn col(&self, x: f64) -> usize {
        let last = (self.rows[0].len() - 1) as f64;
        (fraction(x, self.x_range) * last).round() as usize
    }

    fn row(&self, y: f64) -> usize {
        let last = (self.rows.len() - 1) as f64;
        (last - fraction(y, self.y_range) * last).round() as usize
    }

    fn put(&mut self, x: f64, y: f64, ch: char) {
        let (r, c) = (self.row(y), self.col(x));
        self.rows[r][c] = ch;
    }

    fn vertical(&mut self, x: f64, ch: char) {
        let c = self.col(x);
        for row in &mut self.rows {
            row[c] = ch;
        }
    }

    /// Connect consecutive points; only blank cells are drawn over.
    fn polyline(&mut self, points: &[(f64, f64)], ch: char) {
        let cells: Vec<(usize, usize)> = points.iter().map(|&(x, y)| (self.row(y), self.col(x))).collect();
        if let [only] = cells.as_slice() {
            self.rows[only.0][only.1] = ch;
        }
        for pair in cells.windows(2) {
            self.segment(pair[0], pair[1], ch);
        }
    }

    fn segment(&mut self, (r0, c0): (usize, usize), (r1, c1): (usize, usize), ch: char) {
        let steps = r0.abs_diff(r1).max(c0.abs_diff(c1)).max(1);
        for k in 0..=steps {
            let t = k as f64 / steps as f64;
            let r = (r0 as f64 + t * (r1 as f64 - r0 as f64)).round() as usize;
            let c = (c0 as f64 + t * (c1 as f64 - c0 as f64)).round() as usize;
            let cell = &mut self.rows[r][c];
            if *cell == ' ' {
                *cell = ch;
            }
        }
    }
}

fn fraction(v: f64, (lo, hi): (f64, f64)) -> f64 {
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}
