//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - accumulated in memory across many trials
//! - exported to CSV/JSON
//! - fed straight into the chart builders

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Objective used to fit the Gaussian model to a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitMethod {
    /// Neyman chi-square: `Σ (n_i - f_i)^2 / n_i` over non-empty bins.
    Chi2,
    /// Poisson binned likelihood: `Σ f_i - n_i ln f_i` over all bins.
    #[value(alias = "likelihood")]
    Nll,
}

impl FitMethod {
    /// Human-readable label for terminal output and chart titles.
    pub fn display_name(self) -> &'static str {
        match self {
            FitMethod::Chi2 => "chi2",
            FitMethod::Nll => "NLL",
        }
    }
}

/// Parameters of the Gaussian model `A * exp(-0.5 * ((x - mean) / sigma)^2)`.
///
/// `amplitude` is the peak height in counts per bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussParams {
    pub amplitude: f64,
    pub mean: f64,
    pub sigma: f64,
}

impl GaussParams {
    pub const LEN: usize = 3;

    pub fn new(amplitude: f64, mean: f64, sigma: f64) -> Self {
        Self {
            amplitude,
            mean,
            sigma,
        }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.amplitude, self.mean, self.sigma]
    }

    pub fn from_slice(v: &[f64]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn with_mean(self, mean: f64) -> Self {
        Self { mean, ..self }
    }
}

/// One-sigma uncertainties on the fitted parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamErrors {
    pub amplitude: f64,
    pub mean: f64,
    pub sigma: f64,
}

/// The flat record produced by a single Gaussian fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResults {
    pub method: FitMethod,
    pub amplitude: f64,
    pub mean: f64,
    /// Always reported non-negative (the model is symmetric in sigma).
    pub sigma: f64,
    pub reduced_chi2: f64,
    pub errors: ParamErrors,
    /// Goodness-of-fit statistic: Neyman chi-square for `Chi2` fits,
    /// Baker–Cousins likelihood ratio for `Nll` fits.
    pub chi2: f64,
    pub ndof: f64,
    /// Upper-tail chi-square probability of `chi2` with `ndof` degrees of freedom.
    pub prob: f64,
    /// Minimizer iterations used.
    pub iterations: usize,
    /// False when the minimizer stopped before reaching the minimum; the
    /// parameters are then the last point it reached.
    pub converged: bool,
}

impl FitResults {
    pub fn params(&self) -> GaussParams {
        GaussParams::new(self.amplitude, self.mean, self.sigma)
    }
}

/// How to generate a pseudo-random Gaussian histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSpec {
    pub entries: usize,
    pub mean: f64,
    pub sigma: f64,
    pub bins: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub seed: u64,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            entries: 1000,
            mean: 50.0,
            sigma: 10.0,
            bins: 100,
            x_min: 0.0,
            x_max: 100.0,
            seed: 42,
        }
    }
}

/// Minimizer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub max_iterations: usize,
    /// Relative cost change below which the minimizer stops.
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-10,
        }
    }
}

/// Configuration of a fit-result sweep (many independent samples, one fit each).
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub trials: usize,
    pub sample: SampleSpec,
    pub method: FitMethod,
    pub fit: FitOptions,
    pub out: PathBuf,
    pub export: Option<PathBuf>,
}

/// Configuration of a chi-square vs likelihood comparison.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub trials: usize,
    pub sample: SampleSpec,
    pub fit: FitOptions,
    pub out: PathBuf,
    /// When set, `<prefix>_chi2.csv` and `<prefix>_nll.csv` are written.
    pub export_prefix: Option<PathBuf>,
}

/// Configuration of a toy Monte Carlo goodness-of-fit test.
#[derive(Debug, Clone)]
pub struct ToyConfig {
    pub input: PathBuf,
    pub out: PathBuf,
    pub ntoy: usize,
    pub seed: u64,
    pub fit: FitOptions,
    pub summary: Option<PathBuf>,
    pub plot_width: usize,
    pub plot_height: usize,
}

/// Configuration of the NLL / chi-square scans over the mean.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub input: PathBuf,
    pub nll_out: PathBuf,
    pub chi2_out: PathBuf,
    pub points: usize,
    /// NLL scan covers `mean ± nll_sigmas * rms`.
    pub nll_sigmas: f64,
    pub chi2_center: f64,
    pub chi2_half_width: f64,
    pub summary: Option<PathBuf>,
}
