//! Gaussian model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - build a gradient row `∂f/∂(A, μ, σ)` at a point (for the normal equations)
//! - predict `f(x)` given the parameters (for costs, residuals and plots)
//!
//! The goodness-of-fit statistics additionally need the expected count in a
//! bin, i.e. the model integrated over the bin.

use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erfc;

use crate::domain::GaussParams;
use crate::hist::Histogram1D;

/// Floor for expected bin counts, keeps `ln(μ)` finite.
pub const MIN_EXPECTATION: f64 = 1e-12;

/// Predict `f(x) = A · exp(-½((x-μ)/σ)²)`.
pub fn predict(params: &GaussParams, x: f64) -> f64 {
    if params.sigma == 0.0 {
        return 0.0;
    }
    let z = (x - params.mean) / params.sigma;
    params.amplitude * (-0.5 * z * z).exp()
}

/// Fill the gradient row `[∂f/∂A, ∂f/∂μ, ∂f/∂σ]` at `x`.
///
/// # Panics
/// Panics if `out` has fewer than 3 elements.
pub fn fill_gradient_row(params: &GaussParams, x: f64, out: &mut [f64]) {
    if params.sigma == 0.0 {
        out[..3].iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    let d = x - params.mean;
    let s = params.sigma;
    let g = (-0.5 * d * d / (s * s)).exp();
    let f = params.amplitude * g;
    out[0] = g;
    out[1] = f * d / (s * s);
    out[2] = f * d * d / (s * s * s);
}

/// Expected counts in `[xl, xr]`: the model integral divided by the bin width.
///
/// Dividing by the width keeps `A` in "counts per bin" units, so for unit-width
/// bins this is exactly the integral. Clamped at [`MIN_EXPECTATION`].
pub fn bin_expectation(params: &GaussParams, xl: f64, xr: f64) -> f64 {
    let width = xr - xl;
    let s = params.sigma.abs();
    if width <= 0.0 || s == 0.0 {
        return MIN_EXPECTATION;
    }
    let zl = (xl - params.mean) / s;
    let zr = (xr - params.mean) / s;
    let mass = normal_mass(zl, zr);
    let mu = params.amplitude * s * (2.0 * PI).sqrt() * mass / width;
    if mu > MIN_EXPECTATION && mu.is_finite() {
        mu
    } else {
        MIN_EXPECTATION
    }
}

/// Expected counts for every bin of `hist` under `params`.
pub fn expected_counts(hist: &Histogram1D, params: &GaussParams) -> Vec<f64> {
    (0..hist.n_bins())
        .map(|i| bin_expectation(params, hist.bin_low_edge(i), hist.bin_up_edge(i)))
        .collect()
}

/// Initial parameters from histogram moments: `A = max`, `μ = mean`, `σ = RMS`.
///
/// A histogram with a single populated bin has zero RMS; fall back to a
/// quarter of the axis span so the minimizer has something to work with.
pub fn initial_guess(hist: &Histogram1D) -> GaussParams {
    let rms = hist.std_dev();
    let sigma = if rms > 0.0 {
        rms
    } else {
        0.25 * (hist.x_max() - hist.x_min())
    };
    GaussParams::new(hist.maximum(), hist.mean(), sigma)
}

/// Standard normal probability mass in `[zl, zr]`, computed on the tail that
/// avoids cancellation.
fn normal_mass(zl: f64, zr: f64) -> f64 {
    if zl >= 0.0 {
        // Both in the upper tail: Q(zl) - Q(zr).
        0.5 * (erfc(zl / SQRT_2) - erfc(zr / SQRT_2))
    } else if zr <= 0.0 {
        // Both in the lower tail, mirror.
        0.5 * (erfc(-zr / SQRT_2) - erfc(-zl / SQRT_2))
    } else {
        1.0 - 0.5 * erfc(-zl / SQRT_2) - 0.5 * erfc(zr / SQRT_2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_peaks_at_mean() {
        let p = GaussParams::new(40.0, 50.0, 10.0);
        assert!((predict(&p, 50.0) - 40.0).abs() < 1e-12);
        let one_sigma = 40.0 * (-0.5f64).exp();
        assert!((predict(&p, 60.0) - one_sigma).abs() < 1e-12);
        assert!((predict(&p, 40.0) - one_sigma).abs() < 1e-12);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let p = GaussParams::new(35.0, 48.0, 9.0);
        let x = 55.3;
        let mut row = [0.0; 3];
        fill_gradient_row(&p, x, &mut row);

        let h = 1e-6;
        let base = p.to_array();
        for k in 0..3 {
            let mut up = base;
            let mut dn = base;
            up[k] += h;
            dn[k] -= h;
            let fd = (predict(&GaussParams::from_slice(&up), x) - predict(&GaussParams::from_slice(&dn), x))
                / (2.0 * h);
            assert!((fd - row[k]).abs() < 1e-6, "component {k}: fd={fd} analytic={}", row[k]);
        }
    }

    #[test]
    fn bin_expectations_sum_to_model_integral() {
        // A·σ·√(2π) is the full integral; with unit bins the sum over a wide
        // range must reproduce it.
        let p = GaussParams::new(40.0, 50.0, 10.0);
        let h = Histogram1D::new("h", "t", 200, -50.0, 150.0).unwrap();
        let total: f64 = expected_counts(&h, &p).iter().sum();
        let expected = 40.0 * 10.0 * (2.0 * PI).sqrt();
        assert!((total - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn bin_expectation_close_to_center_value_for_narrow_bins() {
        let p = GaussParams::new(40.0, 50.0, 10.0);
        let mu = bin_expectation(&p, 49.5, 50.5);
        assert!((mu - 40.0).abs() < 0.2);
    }

    #[test]
    fn far_tail_expectation_is_clamped_positive() {
        let p = GaussParams::new(40.0, 50.0, 1.0);
        let mu = bin_expectation(&p, 99.0, 100.0);
        assert_eq!(mu, MIN_EXPECTATION);
    }

    #[test]
    fn negative_sigma_is_symmetric() {
        let p = GaussParams::new(40.0, 50.0, 10.0);
        let q = GaussParams::new(40.0, 50.0, -10.0);
        assert_eq!(predict(&p, 57.0), predict(&q, 57.0));
        assert!((bin_expectation(&p, 55.0, 56.0) - bin_expectation(&q, 55.0, 56.0)).abs() < 1e-12);
    }
}
