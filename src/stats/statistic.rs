//! Goodness-of-fit statistics evaluated against a fixed model.
//!
//! Unlike the fit costs, these use the model integrated over each bin
//! (`models::bin_expectation`), which behaves better asymptotically on coarse
//! or sparse binning.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::domain::GaussParams;
use crate::hist::Histogram1D;
use crate::models::expected_counts;

/// Poisson negative log-likelihood up to additive constants:
/// `Σ_i [μ_i − n_i ln μ_i]`.
pub fn nll_from_model(hist: &Histogram1D, params: &GaussParams) -> f64 {
    nll_from_expected(hist.contents(), &expected_counts(hist, params))
}

/// Same as [`nll_from_model`] with precomputed expectations.
pub fn nll_from_expected(counts: &[f64], expected: &[f64]) -> f64 {
    counts
        .iter()
        .zip(expected)
        .map(|(&n, &mu)| mu - n * mu.ln())
        .sum()
}

/// Pearson chi-square `Σ_i (n_i − μ_i)² / μ_i`.
pub fn chi2_from_model(hist: &Histogram1D, params: &GaussParams) -> f64 {
    hist.contents()
        .iter()
        .zip(expected_counts(hist, params))
        .map(|(&n, mu)| {
            let d = n - mu;
            d * d / mu
        })
        .sum()
}

/// Upper-tail probability `P(χ² ≥ chi2)` for `ndof` degrees of freedom.
///
/// Returns 0 for `ndof <= 0` or a non-finite/negative statistic.
pub fn chi2_probability(chi2: f64, ndof: f64) -> f64 {
    if !(ndof > 0.0 && ndof.is_finite()) || !chi2.is_finite() || chi2 < 0.0 {
        return 0.0;
    }
    if chi2 == 0.0 {
        return 1.0;
    }
    match ChiSquared::new(ndof) {
        Ok(dist) => dist.sf(chi2).clamp(0.0, 1.0),
        Err(_) => 0.0,
    }
}

/// Count / mean / standard deviation of a sample (for report lines).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let count = finite.len();
        if count == 0 {
            return Self {
                count,
                mean: f64::NAN,
                std_dev: f64::NAN,
            };
        }
        let mean = finite.iter().sum::<f64>() / count as f64;
        let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Self {
            count,
            mean,
            std_dev: var.sqrt(),
        }
    }
}
