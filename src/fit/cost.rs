//! Binned cost functions for the Gaussian fit.
//!
//! Both costs are written in Gauss–Newton form. For a parameter vector `θ`
//! each exposes:
//!
//! - `value(θ)`
//! - the score `s(θ)` (minus half the chi-square gradient, or minus the NLL
//!   gradient) and the Fisher information `I(θ)`
//!
//! so the Newton step is `I⁻¹ s` and the covariance at the minimum is `I⁻¹`
//! for both objectives (chi-square with error definition 1, NLL with 0.5).

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitMethod, GaussParams};
use crate::hist::Histogram1D;
use crate::models::{MIN_EXPECTATION, fill_gradient_row, predict};

pub trait Cost {
    fn value(&self, params: &GaussParams) -> f64;

    fn score_and_information(&self, params: &GaussParams) -> (DVector<f64>, DMatrix<f64>);

    /// Goodness-of-fit statistic reported in the fit record.
    fn goodness_of_fit(&self, params: &GaussParams) -> f64;

    /// Number of data points entering the cost.
    fn n_points(&self) -> usize;
}

/// Neyman chi-square `Σ (n_i - f(x_i))² / n_i` over non-empty bins.
#[derive(Debug, Clone)]
pub struct Chi2Cost {
    xs: Vec<f64>,
    ns: Vec<f64>,
}

impl Chi2Cost {
    pub fn from_histogram(hist: &Histogram1D) -> Self {
        let (xs, ns) = (0..hist.n_bins())
            .filter(|&i| hist.bin_content(i) > 0.0)
            .map(|i| (hist.bin_center(i), hist.bin_content(i)))
            .unzip();
        Self { xs, ns }
    }
}

impl Cost for Chi2Cost {
    fn value(&self, params: &GaussParams) -> f64 {
        self.xs
            .iter()
            .zip(&self.ns)
            .map(|(&x, &n)| {
                let r = n - predict(params, x);
                r * r / n
            })
            .sum()
    }

    fn score_and_information(&self, params: &GaussParams) -> (DVector<f64>, DMatrix<f64>) {
        let mut score = DVector::<f64>::zeros(GaussParams::LEN);
        let mut info = DMatrix::<f64>::zeros(GaussParams::LEN, GaussParams::LEN);
        let mut row = [0.0; GaussParams::LEN];

        for (&x, &n) in self.xs.iter().zip(&self.ns) {
            fill_gradient_row(params, x, &mut row);
            let w = 1.0 / n;
            let r = n - predict(params, x);
            accumulate(&mut score, &mut info, &row, w * r, w);
        }
        (score, info)
    }

    fn goodness_of_fit(&self, params: &GaussParams) -> f64 {
        self.value(params)
    }

    fn n_points(&self) -> usize {
        self.xs.len()
    }
}

/// Poisson binned negative log-likelihood `Σ f(x_i) - n_i ln f(x_i)` over all bins.
#[derive(Debug, Clone)]
pub struct PoissonCost {
    xs: Vec<f64>,
    ns: Vec<f64>,
}

impl PoissonCost {
    pub fn from_histogram(hist: &Histogram1D) -> Self {
        let (xs, ns) = (0..hist.n_bins())
            .map(|i| (hist.bin_center(i), hist.bin_content(i)))
            .unzip();
        Self { xs, ns }
    }
}

impl Cost for PoissonCost {
    fn value(&self, params: &GaussParams) -> f64 {
        self.xs
            .iter()
            .zip(&self.ns)
            .map(|(&x, &n)| {
                let f = predict(params, x).max(MIN_EXPECTATION);
                f - n * f.ln()
            })
            .sum()
    }

    fn score_and_information(&self, params: &GaussParams) -> (DVector<f64>, DMatrix<f64>) {
        let mut score = DVector::<f64>::zeros(GaussParams::LEN);
        let mut info = DMatrix::<f64>::zeros(GaussParams::LEN, GaussParams::LEN);
        let mut row = [0.0; GaussParams::LEN];

        for (&x, &n) in self.xs.iter().zip(&self.ns) {
            fill_gradient_row(params, x, &mut row);
            let f = predict(params, x).max(MIN_EXPECTATION);
            accumulate(&mut score, &mut info, &row, n / f - 1.0, 1.0 / f);
        }
        (score, info)
    }

    /// Baker–Cousins likelihood-ratio chi-square.
    fn goodness_of_fit(&self, params: &GaussParams) -> f64 {
        let terms: f64 = self
            .xs
            .iter()
            .zip(&self.ns)
            .map(|(&x, &n)| {
                let f = predict(params, x).max(MIN_EXPECTATION);
                if n > 0.0 { f - n + n * (n / f).ln() } else { f }
            })
            .sum();
        2.0 * terms
    }

    fn n_points(&self) -> usize {
        self.xs.len()
    }
}

/// Build the cost for `method`.
pub fn cost_for(method: FitMethod, hist: &Histogram1D) -> Box<dyn Cost + Send + Sync> {
    match method {
        FitMethod::Chi2 => Box::new(Chi2Cost::from_histogram(hist)),
        FitMethod::Nll => Box::new(PoissonCost::from_histogram(hist)),
    }
}

fn accumulate(score: &mut DVector<f64>, info: &mut DMatrix<f64>, row: &[f64], s_weight: f64, i_weight: f64) {
    for a in 0..row.len() {
        score[a] += s_weight * row[a];
        for b in 0..row.len() {
            info[(a, b)] += i_weight * row[a] * row[b];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_histogram(p: &GaussParams) -> Histogram1D {
        let mut h = Histogram1D::new("h", "t", 100, 0.0, 100.0).unwrap();
        for i in 0..h.n_bins() {
            let x = h.bin_center(i);
            h.set_bin_content(i, predict(p, x));
        }
        h
    }

    #[test]
    fn chi2_skips_empty_bins() {
        let mut h = Histogram1D::new("h", "t", 10, 0.0, 10.0).unwrap();
        h.fill(1.5);
        h.fill(1.5);
        h.fill(7.5);
        let c = Chi2Cost::from_histogram(&h);
        assert_eq!(c.n_points(), 2);
        assert_eq!(PoissonCost::from_histogram(&h).n_points(), 10);
    }

    #[test]
    fn chi2_is_zero_on_exact_model() {
        let p = GaussParams::new(40.0, 50.0, 10.0);
        let h = model_histogram(&p);
        let c = Chi2Cost::from_histogram(&h);
        assert!(c.value(&p).abs() < 1e-9);
        let (score, _) = c.score_and_information(&p);
        assert!(score.norm() < 1e-9);
    }

    #[test]
    fn poisson_score_vanishes_at_exact_model() {
        let p = GaussParams::new(40.0, 50.0, 10.0);
        let h = model_histogram(&p);
        let c = PoissonCost::from_histogram(&h);
        let (score, info) = c.score_and_information(&p);
        assert!(score.norm() < 1e-9);
        assert!(info[(0, 0)] > 0.0);
        assert!(c.goodness_of_fit(&p).abs() < 1e-9);
    }

    #[test]
    fn score_points_downhill() {
        let truth = GaussParams::new(40.0, 50.0, 10.0);
        let h = model_histogram(&truth);
        let off = GaussParams::new(40.0, 53.0, 10.0);
        for c in [cost_for(FitMethod::Chi2, &h), cost_for(FitMethod::Nll, &h)] {
            let (score, _) = c.score_and_information(&off);
            // Mean is too high, so the score on the mean must be negative.
            assert!(score[1] < 0.0);
        }
    }
}
