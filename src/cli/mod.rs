//! Command-line parsing for the Gaussian histogram fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::FitMethod;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "histfit", version, about = "Gaussian histogram fitting diagnostics")]
pub struct Cli {
    /// Verbose logging (debug level for this crate).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for relative output paths.
    #[arg(long, global = true, env = "HISTFIT_OUT_DIR", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a Gaussian histogram and write it to a histogram file.
    Generate(GenerateArgs),
    /// Fit one histogram (generated or loaded) and print the fit summary.
    Fit(FitArgs),
    /// Fit many independent samples and chart the fit-result distributions.
    Sweep(SweepArgs),
    /// Fit small samples with both chi-square and likelihood and chart the means.
    Compare(CompareArgs),
    /// Toy Monte Carlo p-value of a likelihood fit.
    Toys(ToyArgs),
    /// Scan the NLL and chi-square as a function of the mean.
    Scan(ScanArgs),
    /// Print statistics and an ASCII plot of the first histogram in a file.
    Show(ShowArgs),
}

/// How to generate a sample histogram.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Number of Gaussian draws per histogram [default: 1000; compare: 10].
    #[arg(short = 'n', long)]
    pub entries: Option<usize>,

    /// Mean of the generating Gaussian.
    #[arg(long, default_value_t = 50.0)]
    pub mean: f64,

    /// Sigma of the generating Gaussian.
    #[arg(long, default_value_t = 10.0)]
    pub sigma: f64,

    /// Number of bins.
    #[arg(long, default_value_t = 100)]
    pub bins: usize,

    /// Lower edge of the axis.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x_min: f64,

    /// Upper edge of the axis.
    #[arg(long, default_value_t = 100.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Minimizer settings.
#[derive(Debug, Args, Clone)]
pub struct MinimizerArgs {
    /// Maximum number of minimizer iterations.
    #[arg(long, default_value_t = 200)]
    pub max_iterations: usize,

    /// Relative cost change at which the minimizer stops.
    #[arg(long, default_value_t = 1e-10)]
    pub tolerance: f64,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub sample: SampleArgs,

    /// Output histogram file (JSON).
    #[arg(short, long, value_name = "JSON")]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Fit the first histogram of this file instead of generating one.
    #[arg(short, long, value_name = "JSON")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub sample: SampleArgs,

    /// Fit method.
    #[arg(long, value_enum, default_value_t = FitMethod::Chi2)]
    pub method: FitMethod,

    #[command(flatten)]
    pub minimizer: MinimizerArgs,

    /// Save the fitted histogram to a histogram file.
    #[arg(long, value_name = "JSON")]
    pub save: Option<PathBuf>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    /// Number of independent samples.
    #[arg(short, long, default_value_t = 1000)]
    pub trials: usize,

    #[command(flatten)]
    pub sample: SampleArgs,

    /// Fit method.
    #[arg(long, value_enum, default_value_t = FitMethod::Chi2)]
    pub method: FitMethod,

    #[command(flatten)]
    pub minimizer: MinimizerArgs,

    /// Output chart.
    #[arg(short, long, default_value = "result1.svg")]
    pub out: PathBuf,

    /// Export every fit record to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Number of independent samples.
    #[arg(short, long, default_value_t = 1000)]
    pub trials: usize,

    #[command(flatten)]
    pub sample: SampleArgs,

    #[command(flatten)]
    pub minimizer: MinimizerArgs,

    /// Output chart.
    #[arg(short, long, default_value = "result2.svg")]
    pub out: PathBuf,

    /// Write `<prefix>_chi2.csv` and `<prefix>_nll.csv` with every fit record.
    #[arg(long, value_name = "PREFIX")]
    pub export_prefix: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ToyArgs {
    /// Histogram file; the first histogram in it is used.
    #[arg(short, long, default_value = "histo25.json")]
    pub input: PathBuf,

    /// Output chart.
    #[arg(short, long, default_value = "result3.svg")]
    pub out: PathBuf,

    /// Number of pseudo-experiments.
    #[arg(long, default_value_t = 10000)]
    pub ntoy: usize,

    /// Random seed for the toys.
    #[arg(long, default_value_t = 12345)]
    pub seed: u64,

    #[command(flatten)]
    pub minimizer: MinimizerArgs,

    /// Write the outcome as JSON.
    #[arg(long, value_name = "JSON")]
    pub summary: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    /// Histogram file; the first histogram in it is used.
    #[arg(short, long, default_value = "histo1k.json")]
    pub input: PathBuf,

    /// Output chart of the NLL scan.
    #[arg(long, default_value = "results4_1k_nll.svg")]
    pub nll_out: PathBuf,

    /// Output chart of the chi-square scan.
    #[arg(long, default_value = "results4_1k_chi2.svg")]
    pub chi2_out: PathBuf,

    /// Points per scan.
    #[arg(long, default_value_t = 200)]
    pub points: usize,

    /// NLL scan half-width in units of the histogram RMS.
    #[arg(long, default_value_t = 2.0)]
    pub nll_sigmas: f64,

    /// Center of the chi-square scan.
    #[arg(long, default_value_t = 50.0, allow_negative_numbers = true)]
    pub center: f64,

    /// Half-width of the chi-square scan.
    #[arg(long, default_value_t = 3.0)]
    pub half_width: f64,

    /// Write the outcome as JSON.
    #[arg(long, value_name = "JSON")]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Histogram file.
    #[arg(short, long, value_name = "JSON")]
    pub input: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn toys_defaults_follow_the_reference_files() {
        let cli = Cli::parse_from(["histfit", "toys"]);
        let Command::Toys(args) = cli.command else {
            panic!("expected toys");
        };
        assert_eq!(args.input, PathBuf::from("histo25.json"));
        assert_eq!(args.out, PathBuf::from("result3.svg"));
        assert_eq!(args.ntoy, 10000);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["histfit", "sweep", "-t", "5", "--method", "likelihood", "-v"]);
        assert!(cli.verbose);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(args.trials, 5);
        assert_eq!(args.method, FitMethod::Nll);
        assert_eq!(args.sample.entries, None);
    }
}
