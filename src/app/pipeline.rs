//! Shared command pipelines.
//!
//! Each pipeline runs one analysis end to end and writes its files
//! (charts, exports, summaries):
//! input histogram -> analysis -> charts/exports
//!
//! Printing stays in `app` so the pipelines can be driven from tests.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::analysis::{self, CompareOutput, ScanOutcome, SweepOutput, ToyOutcome};
use crate::data::generate_histogram;
use crate::domain::{CompareConfig, SampleSpec, ScanConfig, SweepConfig, ToyConfig};
use crate::error::AppError;
use crate::hist::Histogram1D;
use crate::io::{read_first_histogram, write_results_csv, write_summary_json};
use crate::plot::{Guide, LineChart, draw_histogram_grid, draw_line_chart, draw_toy_nll};

/// The first histogram of `input`, or a freshly generated one.
pub fn load_or_generate(input: Option<&Path>, sample: &SampleSpec) -> Result<Histogram1D, AppError> {
    match input {
        Some(path) => {
            let hist = read_first_histogram(path)?;
            info!(name = %hist.name, path = %path.display(), "loaded histogram");
            Ok(hist)
        }
        None => generate_histogram(sample),
    }
}

/// Place a relative output path under `out_dir`.
pub fn resolve_output(out_dir: Option<&Path>, path: &Path) -> PathBuf {
    match out_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

/// Create the parent directory of an output file.
pub fn ensure_parent(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", dir.display()))),
        _ => Ok(()),
    }
}

/// Fit-result distributions: run the trials, draw the 2×2 chart, export.
pub fn run_sweep(config: &SweepConfig) -> Result<SweepOutput, AppError> {
    let out = analysis::run_trials(&config.sample, config.trials, config.method, &config.fit)?;

    if out.results.is_empty() {
        warn!("no successful fits, chart not drawn");
    } else {
        let panels = analysis::sweep_panels(&out.results)?;
        ensure_parent(&config.out)?;
        draw_histogram_grid(&config.out, &panels, (2, 2), 1)?;
        info!(path = %config.out.display(), "chart written");
    }

    if let Some(path) = &config.export {
        ensure_parent(path)?;
        write_results_csv(path, &out.results)?;
        info!(path = %path.display(), rows = out.results.len(), "fit records exported");
    }
    Ok(out)
}

/// Chi-square vs likelihood means: run the trials, draw the 1×2 chart, export.
pub fn run_comparison(config: &CompareConfig) -> Result<CompareOutput, AppError> {
    let out = analysis::run_compare(&config.sample, config.trials, &config.fit)?;

    if out.chi2.is_empty() && out.nll.is_empty() {
        warn!("no successful fits, chart not drawn");
    } else {
        let panels = analysis::mean_panels(&out, config.sample.x_min, config.sample.x_max)?;
        ensure_parent(&config.out)?;
        draw_histogram_grid(&config.out, &panels, (1, 2), 2)?;
        info!(path = %config.out.display(), "chart written");
    }

    if let Some(prefix) = &config.export_prefix {
        for (suffix, results) in [("chi2", &out.chi2), ("nll", &out.nll)] {
            let path = suffixed(prefix, suffix);
            ensure_parent(&path)?;
            write_results_csv(&path, results)?;
            info!(path = %path.display(), rows = results.len(), "fit records exported");
        }
    }
    Ok(out)
}

/// Toy Monte Carlo p-value: load, fit, run toys, draw, write the summary.
pub fn run_toy_study(config: &ToyConfig) -> Result<(Histogram1D, ToyOutcome), AppError> {
    let data = read_first_histogram(&config.input)?;
    let outcome = analysis::run_toys(&data, config.ntoy, config.seed, &config.fit)?;

    ensure_parent(&config.out)?;
    draw_toy_nll(&config.out, &outcome.nll_hist, outcome.nll_data, outcome.p_value)?;
    info!(path = %config.out.display(), "chart written");

    if let Some(path) = &config.summary {
        ensure_parent(path)?;
        write_summary_json(path, &outcome)?;
    }
    Ok((data, outcome))
}

/// NLL and chi-square scans over the mean: load, scan, draw both charts.
pub fn run_scan_study(config: &ScanConfig) -> Result<ScanOutcome, AppError> {
    let data = read_first_histogram(&config.input)?;
    let outcome = analysis::run_scan(
        &data,
        config.points,
        config.nll_sigmas,
        config.chi2_center,
        config.chi2_half_width,
    )?;

    let (mu0, s0) = (outcome.start.mean, outcome.start.sigma);
    let nll_points: Vec<(f64, f64)> = outcome.nll.points().collect();
    ensure_parent(&config.nll_out)?;
    draw_line_chart(
        &config.nll_out,
        &nll_points,
        &LineChart {
            title: "NLL scan: 2(NLL − NLL_min) vs μ",
            x_label: "μ",
            y_label: "2ΔNLL",
            y_range: Some((0.0, 4.5)),
            guides: [1.0, 4.0]
                .into_iter()
                .map(|level| Guide {
                    from: (mu0, level),
                    to: (mu0 + s0, level),
                })
                .collect(),
        },
    )?;

    let chi2_points: Vec<(f64, f64)> = outcome.chi2.points().collect();
    let (lo, hi) = finite_range(&outcome.chi2.ys);
    ensure_parent(&config.chi2_out)?;
    draw_line_chart(
        &config.chi2_out,
        &chi2_points,
        &LineChart {
            title: "χ² scan vs μ",
            x_label: "μ",
            y_label: "χ²",
            y_range: None,
            guides: vec![Guide {
                from: (config.chi2_center, lo),
                to: (config.chi2_center, hi),
            }],
        },
    )?;
    info!(nll = %config.nll_out.display(), chi2 = %config.chi2_out.display(), "charts written");

    if let Some(path) = &config.summary {
        ensure_parent(path)?;
        write_summary_json(path, &outcome)?;
    }
    Ok(outcome)
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!("_{suffix}.csv"));
    PathBuf::from(name)
}

fn finite_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
