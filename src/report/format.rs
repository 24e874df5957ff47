//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::analysis::{CompareOutput, ScanOutcome, SweepOutput, ToyOutcome};
use crate::domain::FitResults;
use crate::hist::Histogram1D;
use crate::stats::Summary;

/// Name, binning and moments of a histogram.
pub fn format_histogram_stats(hist: &Histogram1D) -> String {
    let mut out = String::new();
    out.push_str(&format!("Histogram: {} ({})\n", hist.name, hist.title));
    out.push_str(&format!(
        "Binning: {} bins on [{}, {})\n",
        hist.n_bins(),
        hist.x_min(),
        hist.x_max()
    ));
    out.push_str(&format!(
        "Entries: {} | underflow={} | overflow={} | integral={}\n",
        hist.entries(),
        hist.underflow(),
        hist.overflow(),
        hist.integral()
    ));
    out.push_str(&format!(
        "Mean: {:.4} | Std Dev: {:.4} | Max bin: {}\n",
        hist.mean(),
        hist.std_dev(),
        hist.maximum()
    ));
    out
}

/// The fit record of a single fit.
pub fn format_fit_summary(fit: &FitResults) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Gaussian fit ({}) ===\n", fit.method.display_name()));
    if !fit.converged {
        out.push_str("WARNING: minimizer did not converge; parameters are its last point\n");
    }
    out.push_str(&format!(
        "chi2/ndf = {:.3}/{} = {:.4} | prob = {:.4} | iterations = {}\n",
        fit.chi2, fit.ndof, fit.reduced_chi2, fit.prob, fit.iterations
    ));
    out.push_str(&format!("{:<10} {:>12} {:>12}\n", "param", "value", "error"));
    out.push_str(&format!("{:-<10} {:-<12} {:-<12}\n", "", "", ""));
    for (name, value, error) in [
        ("amplitude", fit.amplitude, fit.errors.amplitude),
        ("mean", fit.mean, fit.errors.mean),
        ("sigma", fit.sigma, fit.errors.sigma),
    ] {
        out.push_str(&format!("{name:<10} {value:>12.4} {error:>12.4}\n"));
    }
    out
}

/// Count / mean / std dev of the main fit-record fields.
pub fn format_sweep_summary(out: &SweepOutput) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "=== Sweep: {} fits ({} not converged), {} failed ===\n",
        out.results.len(),
        not_converged(&out.results),
        out.failures
    ));
    s.push_str(&summary_table(&out.results));
    s
}

/// Side-by-side distributions of the chi-square and likelihood fits.
pub fn format_compare_summary(out: &CompareOutput) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "=== chi2 fits: {} ({} not converged, {} failed) ===\n",
        out.chi2.len(),
        not_converged(&out.chi2),
        out.chi2_failures
    ));
    s.push_str(&summary_table(&out.chi2));
    s.push('\n');
    s.push_str(&format!(
        "=== NLL fits: {} ({} not converged, {} failed) ===\n",
        out.nll.len(),
        not_converged(&out.nll),
        out.nll_failures
    ));
    s.push_str(&summary_table(&out.nll));
    s
}

/// Data NLL and toy p-value, followed by the fit it was computed from.
pub fn format_toy_summary(outcome: &ToyOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("Data NLL = {:.4}\n", outcome.nll_data));
    out.push_str(&format!(
        "p-value  = {:.4}  (fraction of toys with NLL >= data)\n",
        outcome.p_value
    ));
    out.push_str(&format!(
        "Toys: {} | NLL_toy >= NLL_data: {} | asymptotic chi2 prob = {:.4}\n",
        outcome.ntoy, outcome.n_geq, outcome.asymptotic_p_value
    ));
    out.push_str(&format!(
        "Error on mean from fit: {:.4}\n\n",
        outcome.fit.errors.mean
    ));
    out.push_str(&format_fit_summary(&outcome.fit));
    out
}

/// Scan start point, minima and the `2ΔNLL <= 1` interval.
pub fn format_scan_summary(outcome: &ScanOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Start: A={:.4} | mu0={:.4} | s0={:.4}\n",
        outcome.start.amplitude, outcome.start.mean, outcome.start.sigma
    ));
    out.push_str(&format!(
        "NLL scan: min NLL = {:.4} at mean = {:.4}\n",
        outcome.nll_min, outcome.nll_best_mean
    ));
    match outcome.nll_interval {
        Some((lo, hi)) => out.push_str(&format!(
            "  2ΔNLL <= 1 for mean in [{lo:.4}, {hi:.4}] (±{:.4})\n",
            0.5 * (hi - lo)
        )),
        None => out.push_str("  2ΔNLL <= 1 interval not contained in the scan range\n"),
    }
    out.push_str(&format!(
        "chi2 scan around {}: min chi2 = {:.4} at mean = {:.4}\n",
        outcome.chi2_center, outcome.chi2_min, outcome.chi2_best_mean
    ));
    out
}

fn not_converged(results: &[FitResults]) -> usize {
    results.iter().filter(|r| !r.converged).count()
}

fn summary_table(results: &[FitResults]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<14} {:>8} {:>12} {:>12}\n",
        "field", "n", "mean", "std dev"
    ));
    out.push_str(&format!("{:-<14} {:-<8} {:-<12} {:-<12}\n", "", "", "", ""));

    let fields: [(&str, fn(&FitResults) -> f64); 5] = [
        ("chi2/ndf", |r| r.reduced_chi2),
        ("prob", |r| r.prob),
        ("mean", |r| r.mean),
        ("err mean", |r| r.errors.mean),
        ("sigma", |r| r.sigma),
    ];
    for (name, field) in fields {
        let values: Vec<f64> = results.iter().map(field).collect();
        let s = Summary::of(&values);
        out.push_str(&format!(
            "{name:<14} {:>8} {:>12.4} {:>12.4}\n",
            s.count, s.mean, s.std_dev
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitMethod, ParamErrors};

    fn record(mean: f64) -> FitResults {
        FitResults {
            method: FitMethod::Chi2,
            amplitude: 40.0,
            mean,
            sigma: 10.0,
            reduced_chi2: 1.0,
            errors: ParamErrors {
                amplitude: 1.5,
                mean: 0.3,
                sigma: 0.2,
            },
            chi2: 80.0,
            ndof: 80.0,
            prob: 0.5,
            iterations: 6,
            converged: true,
        }
    }

    #[test]
    fn fit_summary_lists_parameters_with_errors() {
        let txt = format_fit_summary(&record(50.0));
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "=== Gaussian fit (chi2) ===");
        assert_eq!(
            lines[1],
            "chi2/ndf = 80.000/80 = 1.0000 | prob = 0.5000 | iterations = 6"
        );
        assert_eq!(lines[4], "amplitude       40.0000       1.5000");
        assert_eq!(lines[5], "mean            50.0000       0.3000");
    }

    #[test]
    fn unconverged_fit_is_flagged() {
        let fit = FitResults {
            converged: false,
            ..record(50.0)
        };
        let txt = format_fit_summary(&fit);
        assert_eq!(
            txt.lines().nth(1),
            Some("WARNING: minimizer did not converge; parameters are its last point")
        );
        assert!(!format_fit_summary(&record(50.0)).contains("WARNING"));
    }

    #[test]
    fn sweep_summary_reports_field_moments() {
        let out = SweepOutput {
            results: vec![record(49.0), record(51.0)],
            failures: 1,
        };
        let txt = format_sweep_summary(&out);
        assert!(txt.starts_with("=== Sweep: 2 fits (0 not converged), 1 failed ===\n"));
        assert!(txt.contains("mean                  2      50.0000       1.0000\n"));
    }
}
