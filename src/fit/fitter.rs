//! Gaussian fit of a binned histogram.
//!
//! Given a histogram and a [`FitMethod`] we:
//! - start from histogram moments (`A = max`, `μ = mean`, `σ = RMS`)
//! - minimize the cost with Levenberg–Marquardt on the Fisher information
//! - invert the information at the minimum for the parameter covariance
//! - turn the goodness-of-fit statistic into `χ²/ndf` and a p-value
//!
//! A fit that runs out of iterations, or stalls with a large estimated
//! distance to the minimum, is still returned with `converged = false`.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;
use tracing::debug;

use crate::domain::{FitMethod, FitOptions, FitResults, GaussParams, ParamErrors};
use crate::fit::cost::{Cost, cost_for};
use crate::hist::Histogram1D;
use crate::math::{invert_spd, solve_linear_system};
use crate::models::initial_guess;
use crate::stats::chi2_probability;

/// Minimum number of populated bins for any fit.
const MIN_POPULATED_BINS: usize = 3;

const LAMBDA_START: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
/// Damping beyond which no downhill step exists at working precision.
const LAMBDA_MAX: f64 = 1e12;
/// Largest estimated distance to the minimum `sᵀ I⁻¹ s` of a converged fit,
/// in units of the error definition.
const EDM_MAX: f64 = 2e-5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("too few points for a {method} fit ({points} usable, ndof={ndof})")]
    TooFewPoints {
        method: &'static str,
        points: usize,
        ndof: i64,
    },
    #[error("cost is not finite at iteration {iteration}")]
    NonFiniteCost { iteration: usize },
    #[error("information matrix is singular at the minimum")]
    SingularCovariance,
}

/// Outcome of the minimizer before it is turned into a [`FitResults`].
#[derive(Debug, Clone)]
pub struct Minimum {
    pub params: GaussParams,
    pub iterations: usize,
    pub converged: bool,
}

/// Fit a Gaussian to `hist` over its full axis range.
pub fn fit_gaussian(hist: &Histogram1D, method: FitMethod, opts: &FitOptions) -> Result<FitResults, FitError> {
    let populated = hist.contents().iter().filter(|&&n| n > 0.0).count();
    let cost = cost_for(method, hist);
    let ndof = cost.n_points() as i64 - GaussParams::LEN as i64;
    if populated < MIN_POPULATED_BINS || ndof <= 0 {
        return Err(FitError::TooFewPoints {
            method: method.display_name(),
            points: cost.n_points().min(populated),
            ndof,
        });
    }

    let start = initial_guess(hist);
    let min = minimize(cost.as_ref(), start, opts)?;

    let (_, info) = cost.score_and_information(&min.params);
    let cov = invert_spd(&info).ok_or(FitError::SingularCovariance)?;
    let err = |k: usize| cov[(k, k)].max(0.0).sqrt();

    let chi2 = cost.goodness_of_fit(&min.params);
    let ndof = ndof as f64;
    let results = FitResults {
        method,
        amplitude: min.params.amplitude,
        mean: min.params.mean,
        sigma: min.params.sigma.abs(),
        reduced_chi2: chi2 / ndof,
        errors: ParamErrors {
            amplitude: err(0),
            mean: err(1),
            sigma: err(2),
        },
        chi2,
        ndof,
        prob: chi2_probability(chi2, ndof),
        iterations: min.iterations,
        converged: min.converged,
    };
    debug!(
        method = method.display_name(),
        mean = results.mean,
        sigma = results.sigma,
        chi2 = results.chi2,
        ndof = results.ndof,
        iterations = results.iterations,
        converged = results.converged,
        "gaussian fit done"
    );
    Ok(results)
}

/// Levenberg–Marquardt minimization of `cost` from `start`.
pub fn minimize(cost: &dyn Cost, start: GaussParams, opts: &FitOptions) -> Result<Minimum, FitError> {
    let mut params = start;
    let mut value = cost.value(&params);
    if !value.is_finite() {
        return Err(FitError::NonFiniteCost { iteration: 0 });
    }

    let mut lambda = LAMBDA_START;
    for iteration in 1..=opts.max_iterations {
        let (score, info) = cost.score_and_information(&params);
        if !(score.iter().all(|v| v.is_finite()) && info.iter().all(|v| v.is_finite())) {
            return Err(FitError::NonFiniteCost { iteration });
        }

        // Inner loop: raise damping until the step goes downhill.
        loop {
            let mut damped = info.clone();
            for k in 0..GaussParams::LEN {
                damped[(k, k)] += lambda * info[(k, k)].max(f64::MIN_POSITIVE);
            }

            let step = solve_linear_system(&damped, &score);
            let candidate = step.as_ref().map(|delta| apply_step(&params, delta));
            let candidate_value = candidate.as_ref().map(|p| cost.value(p));

            match (candidate, candidate_value) {
                (Some(next), Some(next_value)) if next_value.is_finite() && next_value <= value => {
                    let rel = (value - next_value) / value.abs().max(f64::MIN_POSITIVE);
                    let negligible = step_is_negligible(&params, &next);
                    // A tiny gain under heavy damping says nothing about the minimum.
                    let undamped = lambda <= 1.0;
                    params = next;
                    value = next_value;
                    lambda = (lambda / 10.0).max(LAMBDA_MIN);
                    if (rel < opts.tolerance && undamped) || negligible {
                        return Ok(Minimum {
                            params,
                            iterations: iteration,
                            converged: true,
                        });
                    }
                    break;
                }
                _ => {
                    lambda *= 10.0;
                    if lambda > LAMBDA_MAX {
                        // No descent direction left. Only a minimum if the score is flat there.
                        let edm = estimated_distance(&score, &info);
                        if edm >= EDM_MAX {
                            debug!(iteration, edm, "minimizer stalled away from the minimum");
                        }
                        return Ok(Minimum {
                            params,
                            iterations: iteration,
                            converged: edm < EDM_MAX,
                        });
                    }
                }
            }
        }
    }

    debug!(iterations = opts.max_iterations, "minimizer hit the iteration limit");
    Ok(Minimum {
        params,
        iterations: opts.max_iterations,
        converged: false,
    })
}

/// `sᵀ I⁻¹ s`: the cost decrease a full Newton step would bring, per unit of
/// error definition. Infinite when the information cannot be inverted.
fn estimated_distance(score: &DVector<f64>, info: &DMatrix<f64>) -> f64 {
    match invert_spd(info) {
        Some(cov) => score.dot(&(cov * score)).abs(),
        None => f64::INFINITY,
    }
}

fn apply_step(params: &GaussParams, delta: &DVector<f64>) -> GaussParams {
    GaussParams::new(
        params.amplitude + delta[0],
        params.mean + delta[1],
        params.sigma + delta[2],
    )
}

fn step_is_negligible(a: &GaussParams, b: &GaussParams) -> bool {
    a.to_array()
        .iter()
        .zip(b.to_array())
        .all(|(x, y)| (x - y).abs() <= 1e-12 * x.abs().max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_histogram;
    use crate::domain::SampleSpec;
    use crate::models::predict;

    fn exact_model_histogram(p: &GaussParams) -> Histogram1D {
        let mut h = Histogram1D::new("h", "t", 100, 0.0, 100.0).unwrap();
        for i in 0..h.n_bins() {
            let x = h.bin_center(i);
            h.set_bin_content(i, predict(p, x));
        }
        h
    }

    #[test]
    fn recovers_noiseless_model_exactly() {
        let truth = GaussParams::new(40.0, 47.0, 8.0);
        let h = exact_model_histogram(&truth);
        for method in [FitMethod::Chi2, FitMethod::Nll] {
            let fit = fit_gaussian(&h, method, &FitOptions::default()).unwrap();
            assert!((fit.amplitude - 40.0).abs() < 1e-6, "{method:?}: A={}", fit.amplitude);
            assert!((fit.mean - 47.0).abs() < 1e-6, "{method:?}: mean={}", fit.mean);
            assert!((fit.sigma - 8.0).abs() < 1e-6, "{method:?}: sigma={}", fit.sigma);
            assert!(fit.chi2 < 1e-8);
            assert!(fit.converged);
        }
    }

    #[test]
    fn fixed_seed_sample_fits_close_to_generator() {
        let spec = SampleSpec {
            seed: 7,
            ..SampleSpec::default()
        };
        let h = generate_histogram(&spec).unwrap();
        for method in [FitMethod::Chi2, FitMethod::Nll] {
            let fit = fit_gaussian(&h, method, &FitOptions::default()).unwrap();
            // 1000 entries: error on the mean ≈ 10/√1000 ≈ 0.32.
            assert!((fit.mean - 50.0).abs() < 1.5, "{method:?}: mean={}", fit.mean);
            assert!((fit.sigma - 10.0).abs() < 1.5, "{method:?}: sigma={}", fit.sigma);
            assert!(fit.errors.mean > 0.2 && fit.errors.mean < 0.5, "{method:?}: err={}", fit.errors.mean);
            assert!(fit.prob >= 0.0 && fit.prob <= 1.0);
            assert!(fit.reduced_chi2 > 0.0 && fit.reduced_chi2 < 3.0);
        }
    }

    #[test]
    fn chi2_ndof_counts_populated_bins_and_nll_counts_all() {
        let spec = SampleSpec {
            seed: 11,
            ..SampleSpec::default()
        };
        let h = generate_histogram(&spec).unwrap();
        let populated = h.contents().iter().filter(|&&n| n > 0.0).count();

        let chi2 = fit_gaussian(&h, FitMethod::Chi2, &FitOptions::default()).unwrap();
        assert_eq!(chi2.ndof, (populated - 3) as f64);

        let nll = fit_gaussian(&h, FitMethod::Nll, &FitOptions::default()).unwrap();
        assert_eq!(nll.ndof, 97.0);
    }

    #[test]
    fn iteration_limit_keeps_the_last_point() {
        let spec = SampleSpec {
            seed: 3,
            ..SampleSpec::default()
        };
        let h = generate_histogram(&spec).unwrap();
        let opts = FitOptions {
            max_iterations: 1,
            ..FitOptions::default()
        };
        let fit = fit_gaussian(&h, FitMethod::Chi2, &opts).unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.iterations, 1);
        assert!(fit.errors.mean > 0.0);
    }

    #[test]
    fn stall_at_the_minimum_counts_as_converged() {
        let truth = GaussParams::new(40.0, 47.0, 8.0);
        let h = exact_model_histogram(&truth);
        let cost = cost_for(FitMethod::Nll, &h);
        // Starting on the minimum leaves no downhill step at all.
        let min = minimize(cost.as_ref(), truth, &FitOptions::default()).unwrap();
        assert!(min.converged);
        assert!((min.params.mean - truth.mean).abs() < 1e-9);
        assert!((min.params.sigma - truth.sigma).abs() < 1e-9);
    }

    #[test]
    fn flat_score_has_zero_distance() {
        let info = DMatrix::<f64>::identity(3, 3) * 4.0;
        assert_eq!(estimated_distance(&DVector::zeros(3), &info), 0.0);
        let score = DVector::from_row_slice(&[2.0, 0.0, 0.0]);
        assert!((estimated_distance(&score, &info) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_nearly_empty_histogram() {
        let mut h = Histogram1D::new("h", "t", 100, 0.0, 100.0).unwrap();
        h.fill(50.0);
        h.fill(51.0);
        let err = fit_gaussian(&h, FitMethod::Nll, &FitOptions::default()).unwrap_err();
        assert!(matches!(err, FitError::TooFewPoints { .. }));
    }

    #[test]
    fn chi2_needs_positive_ndof() {
        let mut h = Histogram1D::new("h", "t", 100, 0.0, 100.0).unwrap();
        for x in [40.0, 50.0, 60.0] {
            h.fill(x);
        }
        // Three populated bins, three parameters: nothing left to test the fit.
        let err = fit_gaussian(&h, FitMethod::Chi2, &FitOptions::default()).unwrap_err();
        assert_eq!(
            err,
            FitError::TooFewPoints {
                method: "chi2",
                points: 3,
                ndof: 0
            }
        );
    }
}
