//! Toy Monte Carlo goodness-of-fit test.
//!
//! 1. Fit the data histogram with a Poisson likelihood.
//! 2. Compute the data NLL against the fitted model using bin integrals.
//! 3. Resample every bin from `Poisson(μ_i)` `ntoy` times and compute the NLL
//!    of each toy against the same model.
//! 4. The p-value is the fraction of toys with `NLL_toy >= NLL_data`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::data::derive_seed;
use crate::domain::{FitMethod, FitOptions, FitResults};
use crate::error::AppError;
use crate::fit::fit_gaussian;
use crate::hist::Histogram1D;
use crate::models::expected_counts;
use crate::stats::nll_from_expected;

/// Number of bins of the toy NLL histogram.
pub const NLL_HIST_BINS: usize = 80;

#[derive(Debug, Clone, Serialize)]
pub struct ToyOutcome {
    pub input_name: String,
    pub fit: FitResults,
    pub nll_data: f64,
    pub ntoy: usize,
    /// Toys with `NLL_toy >= NLL_data`.
    pub n_geq: usize,
    pub p_value: f64,
    /// Asymptotic chi-square probability of the same fit, for comparison.
    pub asymptotic_p_value: f64,
    #[serde(skip)]
    pub nll_hist: Histogram1D,
}

/// Half-width of the toy NLL histogram around the data NLL.
///
/// The NLL of `n` Poisson bins fluctuates with a spread of roughly `√(n/2)`;
/// three times `√(2n)` comfortably contains the toy distribution.
pub fn nll_hist_span(n_bins: usize) -> f64 {
    (3.0 * (2.0 * n_bins as f64).sqrt()).max(10.0)
}

/// Fit `data`, then run `ntoy` pseudo-experiments from the fitted model.
pub fn run_toys(data: &Histogram1D, ntoy: usize, seed: u64, opts: &FitOptions) -> Result<ToyOutcome, AppError> {
    if ntoy == 0 {
        return Err(AppError::new(2, "Number of toys must be > 0."));
    }

    let fit = fit_gaussian(data, FitMethod::Nll, opts)?;
    let expected = expected_counts(data, &fit.params());
    let nll_data = nll_from_expected(data.contents(), &expected);
    info!(nll_data, mean = fit.mean, err_mean = fit.errors.mean, ntoy, "data fitted, generating toys");

    let dists = expected
        .iter()
        .map(|&mu| Poisson::new(mu).map_err(|e| AppError::new(4, format!("Invalid Poisson mean {mu}: {e}"))))
        .collect::<Result<Vec<_>, AppError>>()?;

    let toy_nll: Vec<f64> = (0..ntoy)
        .into_par_iter()
        .map(|t| {
            let mut rng = StdRng::seed_from_u64(derive_seed(seed, "toy", t));
            let counts: Vec<f64> = dists.iter().map(|d| d.sample(&mut rng)).collect();
            nll_from_expected(&counts, &expected)
        })
        .collect();

    let span = nll_hist_span(data.n_bins());
    let mut nll_hist = Histogram1D::new(
        "hNLL",
        "NLL distribution from pseudo-experiments",
        NLL_HIST_BINS,
        nll_data - span,
        nll_data + span,
    )?
    .with_labels("NLL", "Counts");

    let mut n_geq = 0;
    for &v in &toy_nll {
        nll_hist.fill(v);
        if v >= nll_data {
            n_geq += 1;
        }
    }
    let p_value = n_geq as f64 / ntoy as f64;
    info!(p_value, n_geq, "toys finished");

    Ok(ToyOutcome {
        input_name: data.name.clone(),
        asymptotic_p_value: fit.prob,
        fit,
        nll_data,
        ntoy,
        n_geq,
        p_value,
        nll_hist,
    })
}
