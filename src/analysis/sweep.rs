//! Fit-result distributions over many independent samples.
//!
//! Each trial generates a fresh histogram from the sample spec (with a derived
//! seed) and fits it once. Fits that stop short of the minimum are kept with
//! `converged = false`. Fits that cannot run at all are counted, not fatal:
//! on small samples a handful of degenerate histograms is expected.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::{generate_histogram, trial_spec, validate_spec};
use crate::domain::{FitMethod, FitOptions, FitResults, SampleSpec};
use crate::error::AppError;
use crate::fit::fit_gaussian;
use crate::hist::Histogram1D;

/// Fits collected by a sweep, in trial order.
#[derive(Debug, Clone)]
pub struct SweepOutput {
    pub results: Vec<FitResults>,
    pub failures: usize,
}

/// One panel of the result chart: which field to histogram and how to bin it.
#[derive(Debug, Clone, Copy)]
pub struct ResultPanel {
    pub name: &'static str,
    pub title: &'static str,
    pub x_label: &'static str,
    pub bins: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub value: fn(&FitResults) -> f64,
}

/// Panels of the sweep chart, row-major 2×2.
pub const SWEEP_PANELS: [ResultPanel; 4] = [
    ResultPanel {
        name: "h_chi2",
        title: "Reduced χ² distribution",
        x_label: "χ²/ndf",
        bins: 50,
        x_min: 0.0,
        x_max: 3.0,
        value: reduced_chi2_of,
    },
    ResultPanel {
        name: "h_mean",
        title: "Distribution of mean from fits",
        x_label: "mean",
        bins: 50,
        x_min: 40.0,
        x_max: 60.0,
        value: mean_of,
    },
    ResultPanel {
        name: "h_prob",
        title: "χ² Probability",
        x_label: "P(χ²)",
        bins: 50,
        x_min: 0.0,
        x_max: 1.0,
        value: prob_of,
    },
    ResultPanel {
        name: "h_err_mu",
        title: "Error on mean from fits",
        x_label: "σ_mean",
        bins: 50,
        x_min: 0.0,
        x_max: 2.0,
        value: mean_error_of,
    },
];

fn reduced_chi2_of(r: &FitResults) -> f64 {
    r.reduced_chi2
}

fn mean_of(r: &FitResults) -> f64 {
    r.mean
}

fn prob_of(r: &FitResults) -> f64 {
    r.prob
}

fn mean_error_of(r: &FitResults) -> f64 {
    r.errors.mean
}

/// Run `trials` independent generate-and-fit trials in parallel.
pub fn run_trials(
    sample: &SampleSpec,
    trials: usize,
    method: FitMethod,
    opts: &FitOptions,
) -> Result<SweepOutput, AppError> {
    validate_spec(sample)?;
    info!(trials, entries = sample.entries, method = method.display_name(), "running sweep");

    let outcomes = (0..trials)
        .into_par_iter()
        .map(|i| {
            let hist = generate_histogram(&trial_spec(sample, i))?;
            Ok(fit_gaussian(&hist, method, opts).map_err(|e| (i, e)))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = 0;
    for outcome in outcomes {
        match outcome {
            Ok(r) => results.push(r),
            Err((trial, err)) => {
                debug!(trial, %err, "fit failed");
                failures += 1;
            }
        }
    }

    info!(fits = results.len(), failures, "sweep finished");
    Ok(SweepOutput { results, failures })
}

/// Histogram the chosen field of every fit record.
pub fn fill_panel(panel: &ResultPanel, results: &[FitResults]) -> Result<Histogram1D, AppError> {
    let mut hist = Histogram1D::new(panel.name, panel.title, panel.bins, panel.x_min, panel.x_max)?
        .with_labels(panel.x_label, "Counts");
    for r in results {
        hist.fill((panel.value)(r));
    }
    Ok(hist)
}

/// The four sweep panels filled from `results`.
pub fn sweep_panels(results: &[FitResults]) -> Result<Vec<Histogram1D>, AppError> {
    SWEEP_PANELS.iter().map(|p| fill_panel(p, results)).collect()
}
