//! One-dimensional scans of the NLL and chi-square over the Gaussian mean.
//!
//! The model starts from the histogram moments (`A = max`, `μ0 = mean`,
//! `σ = RMS`) and only the mean is varied; amplitude and width stay fixed.

use serde::Serialize;
use tracing::info;

use crate::domain::GaussParams;
use crate::error::AppError;
use crate::hist::Histogram1D;
use crate::models::initial_guess;
use crate::stats::{chi2_from_model, nll_from_model};

/// A sampled curve `y(mean)`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanCurve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl ScanCurve {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Index and value of the smallest `y`.
    pub fn minimum(&self) -> Option<(usize, f64)> {
        self.ys
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, y)| y.is_finite())
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Range of `x` around the minimum where `y <= level`, with the crossings
    /// linearly interpolated. `None` if the curve does not rise above `level`
    /// on both sides within the scanned range.
    pub fn interval_below(&self, level: f64) -> Option<(f64, f64)> {
        let (imin, ymin) = self.minimum()?;
        if ymin > level {
            return None;
        }

        let left = (0..imin)
            .rev()
            .find(|&i| self.ys[i] > level)
            .map(|i| self.crossing(i, i + 1, level))?;
        let right = (imin + 1..self.ys.len())
            .find(|&i| self.ys[i] > level)
            .map(|i| self.crossing(i - 1, i, level))?;
        Some((left, right))
    }

    fn crossing(&self, a: usize, b: usize, level: f64) -> f64 {
        let (x0, y0, x1, y1) = (self.xs[a], self.ys[a], self.xs[b], self.ys[b]);
        if (y1 - y0).abs() < f64::EPSILON {
            return 0.5 * (x0 + x1);
        }
        x0 + (level - y0) * (x1 - x0) / (y1 - y0)
    }
}

/// Evaluate `stat` on `points` evenly spaced means in `[lo, hi]`.
pub fn scan_mean(
    base: &GaussParams,
    lo: f64,
    hi: f64,
    points: usize,
    stat: impl Fn(&GaussParams) -> f64,
) -> Result<ScanCurve, AppError> {
    if points < 2 {
        return Err(AppError::new(2, "Scan needs at least 2 points."));
    }
    if !(lo.is_finite() && hi.is_finite() && hi > lo) {
        return Err(AppError::new(2, format!("Invalid scan range: [{lo}, {hi}].")));
    }

    let mut xs = Vec::with_capacity(points);
    let mut ys = Vec::with_capacity(points);
    for i in 0..points {
        let mu = lo + (hi - lo) * (i as f64 / (points as f64 - 1.0));
        xs.push(mu);
        ys.push(stat(&base.with_mean(mu)));
    }
    Ok(ScanCurve { xs, ys })
}

/// Results of both scans.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub input_name: String,
    pub start: GaussParams,
    /// `-2 Δ ln L = 2 (NLL − NLL_min)` over `start.mean ± nll_sigmas · σ`.
    pub nll: ScanCurve,
    pub nll_min: f64,
    pub nll_best_mean: f64,
    /// Interval where `2ΔNLL <= 1`.
    pub nll_interval: Option<(f64, f64)>,
    /// Chi-square around the requested center.
    pub chi2: ScanCurve,
    pub chi2_center: f64,
    pub chi2_min: f64,
    pub chi2_best_mean: f64,
}

/// Run the NLL scan around the histogram mean and the chi-square scan around
/// `chi2_center`.
pub fn run_scan(
    hist: &Histogram1D,
    points: usize,
    nll_sigmas: f64,
    chi2_center: f64,
    chi2_half_width: f64,
) -> Result<ScanOutcome, AppError> {
    if hist.integral() <= 0.0 {
        return Err(AppError::new(3, format!("Histogram '{}' is empty.", hist.name)));
    }
    let start = initial_guess(hist);
    let mu0 = start.mean;
    let s0 = start.sigma;
    info!(mu0, s0, amplitude = start.amplitude, points, "scanning mean");

    let mut nll = scan_mean(
        &start,
        mu0 - nll_sigmas * s0,
        mu0 + nll_sigmas * s0,
        points,
        |p| nll_from_model(hist, p),
    )?;
    let (imin, nll_min) = nll
        .minimum()
        .ok_or_else(|| AppError::new(4, "NLL scan produced no finite values."))?;
    let nll_best_mean = nll.xs[imin];
    for y in &mut nll.ys {
        *y = 2.0 * (*y - nll_min);
    }
    let nll_interval = nll.interval_below(1.0);

    let chi2 = scan_mean(
        &start,
        chi2_center - chi2_half_width,
        chi2_center + chi2_half_width,
        points,
        |p| chi2_from_model(hist, p),
    )?;
    let (jmin, chi2_min) = chi2
        .minimum()
        .ok_or_else(|| AppError::new(4, "Chi-square scan produced no finite values."))?;
    let chi2_best_mean = chi2.xs[jmin];

    info!(nll_best_mean, chi2_best_mean, "scan finished");
    Ok(ScanOutcome {
        input_name: hist.name.clone(),
        start,
        nll,
        nll_min,
        nll_best_mean,
        nll_interval,
        chi2,
        chi2_center,
        chi2_min,
        chi2_best_mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_histogram;
    use crate::domain::SampleSpec;

    #[test]
    fn scan_grid_includes_endpoints() {
        let base = GaussParams::new(1.0, 0.0, 1.0);
        let c = scan_mean(&base, -1.0, 1.0, 5, |p| p.mean * p.mean).unwrap();
        assert_eq!(c.xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(c.minimum(), Some((2, 0.0)));
    }

    #[test]
    fn interval_interpolates_crossings() {
        let c = ScanCurve {
            xs: vec![-2.0, -1.0, 0.0, 1.0, 2.0],
            ys: vec![4.0, 1.0, 0.0, 1.0, 4.0],
        };
        assert_eq!(c.interval_below(2.5), Some((-1.5, 1.5)));
        assert_eq!(c.interval_below(10.0), None);
    }

    #[test]
    fn nll_scan_is_zero_at_minimum_near_sample_mean() {
        let h = generate_histogram(&SampleSpec {
            seed: 17,
            ..SampleSpec::default()
        })
        .unwrap();
        let out = run_scan(&h, 200, 2.0, 50.0, 3.0).unwrap();

        assert_eq!(out.nll.xs.len(), 200);
        let (_, min) = out.nll.minimum().unwrap();
        assert_eq!(min, 0.0);
        assert!(out.nll.ys.iter().all(|&y| y >= 0.0));
        assert!((out.nll_best_mean - h.mean()).abs() < 1.0);

        // 1000 entries, σ=10: the 1σ interval on the mean is about ±0.3.
        let (lo, hi) = out.nll_interval.unwrap();
        assert!(lo < out.nll_best_mean && out.nll_best_mean < hi);
        assert!(hi - lo > 0.3 && hi - lo < 1.2, "width={}", hi - lo);

        assert_eq!(out.chi2.xs[0], 47.0);
        assert_eq!(*out.chi2.xs.last().unwrap(), 53.0);
        assert!((out.chi2_best_mean - 50.0).abs() < 2.0);
    }

    #[test]
    fn empty_histogram_is_rejected() {
        let h = Histogram1D::new("h", "t", 10, 0.0, 10.0).unwrap();
        assert_eq!(run_scan(&h, 10, 2.0, 5.0, 1.0).unwrap_err().exit_code(), 3);
    }
}
