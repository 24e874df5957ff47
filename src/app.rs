//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - builds per-command configuration
//! - runs the pipelines and prints reports/plots

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{
    Cli, Command, CompareArgs, FitArgs, GenerateArgs, MinimizerArgs, SampleArgs, ScanArgs, ShowArgs, SweepArgs,
    ToyArgs,
};
use crate::domain::{CompareConfig, FitOptions, SampleSpec, ScanConfig, SweepConfig, ToyConfig};
use crate::error::AppError;

pub mod logging;
pub mod pipeline;

use pipeline::{ensure_parent, resolve_output};

/// Default number of entries per histogram in `compare` (small samples).
const COMPARE_ENTRIES: usize = 10;

/// Entry point for the `histfit` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; anything set there only provides defaults.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let out_dir = cli.out_dir.as_deref();
    match cli.command {
        Command::Generate(args) => handle_generate(args, out_dir),
        Command::Fit(args) => handle_fit(args, out_dir),
        Command::Sweep(args) => handle_sweep(&sweep_config_from_args(&args, out_dir)),
        Command::Compare(args) => handle_compare(&compare_config_from_args(&args, out_dir)),
        Command::Toys(args) => handle_toys(&toy_config_from_args(&args, out_dir)),
        Command::Scan(args) => handle_scan(&scan_config_from_args(&args, out_dir)),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_generate(args: GenerateArgs, out_dir: Option<&Path>) -> Result<(), AppError> {
    let spec = sample_spec_from_args(&args.sample, SampleSpec::default().entries);
    let hist = crate::data::generate_histogram(&spec)?;
    let out = resolve_output(out_dir, &args.out);
    ensure_parent(&out)?;
    crate::io::write_histogram_file(&out, std::slice::from_ref(&hist))?;
    info!(path = %out.display(), entries = spec.entries, "histogram written");

    println!("{}", crate::report::format_histogram_stats(&hist));
    Ok(())
}

fn handle_fit(args: FitArgs, out_dir: Option<&Path>) -> Result<(), AppError> {
    let spec = sample_spec_from_args(&args.sample, SampleSpec::default().entries);
    let hist = pipeline::load_or_generate(args.input.as_deref(), &spec)?;
    let fit = crate::fit::fit_gaussian(&hist, args.method, &fit_options_from_args(&args.minimizer))?;
    if !fit.converged {
        warn!(iterations = fit.iterations, "fit did not converge");
    }

    println!("{}", crate::report::format_histogram_stats(&hist));
    println!("{}", crate::report::format_fit_summary(&fit));

    if !args.no_plot {
        let plot = crate::plot::render_ascii_histogram(&hist, Some(&fit.params()), None, args.width, args.height);
        println!("{plot}");
    }

    if let Some(path) = &args.save {
        let path = resolve_output(out_dir, path);
        ensure_parent(&path)?;
        crate::io::write_histogram_file(&path, std::slice::from_ref(&hist))?;
        info!(path = %path.display(), "histogram saved");
    }
    Ok(())
}

fn handle_sweep(config: &SweepConfig) -> Result<(), AppError> {
    let out = pipeline::run_sweep(config)?;
    println!("{}", crate::report::format_sweep_summary(&out));
    Ok(())
}

fn handle_compare(config: &CompareConfig) -> Result<(), AppError> {
    let out = pipeline::run_comparison(config)?;
    println!("{}", crate::report::format_compare_summary(&out));
    Ok(())
}

fn handle_toys(config: &ToyConfig) -> Result<(), AppError> {
    let (data, outcome) = pipeline::run_toy_study(config)?;
    println!("{}", crate::report::format_toy_summary(&outcome));

    let toy_plot = crate::plot::render_ascii_histogram(
        &outcome.nll_hist,
        None,
        Some(outcome.nll_data),
        config.plot_width,
        config.plot_height,
    );
    println!("Toy NLL distribution (| = data):\n{toy_plot}");

    let data_plot = crate::plot::render_ascii_histogram(
        &data,
        Some(&outcome.fit.params()),
        None,
        config.plot_width,
        config.plot_height,
    );
    println!("Data and fitted model:\n{data_plot}");
    Ok(())
}

fn handle_scan(config: &ScanConfig) -> Result<(), AppError> {
    let outcome = pipeline::run_scan_study(config)?;
    println!("{}", crate::report::format_scan_summary(&outcome));
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let hist = crate::io::read_first_histogram(&args.input)?;
    println!("{}", crate::report::format_histogram_stats(&hist));
    println!(
        "{}",
        crate::plot::render_ascii_histogram(&hist, None, None, args.width, args.height)
    );
    Ok(())
}

pub fn sample_spec_from_args(args: &SampleArgs, default_entries: usize) -> SampleSpec {
    SampleSpec {
        entries: args.entries.unwrap_or(default_entries),
        mean: args.mean,
        sigma: args.sigma,
        bins: args.bins,
        x_min: args.x_min,
        x_max: args.x_max,
        seed: args.seed,
    }
}

pub fn fit_options_from_args(args: &MinimizerArgs) -> FitOptions {
    FitOptions {
        max_iterations: args.max_iterations,
        tolerance: args.tolerance,
    }
}

pub fn sweep_config_from_args(args: &SweepArgs, out_dir: Option<&Path>) -> SweepConfig {
    SweepConfig {
        trials: args.trials,
        sample: sample_spec_from_args(&args.sample, SampleSpec::default().entries),
        method: args.method,
        fit: fit_options_from_args(&args.minimizer),
        out: resolve_output(out_dir, &args.out),
        export: resolve_optional(out_dir, args.export.as_deref()),
    }
}

pub fn compare_config_from_args(args: &CompareArgs, out_dir: Option<&Path>) -> CompareConfig {
    CompareConfig {
        trials: args.trials,
        sample: sample_spec_from_args(&args.sample, COMPARE_ENTRIES),
        fit: fit_options_from_args(&args.minimizer),
        out: resolve_output(out_dir, &args.out),
        export_prefix: resolve_optional(out_dir, args.export_prefix.as_deref()),
    }
}

pub fn toy_config_from_args(args: &ToyArgs, out_dir: Option<&Path>) -> ToyConfig {
    ToyConfig {
        input: args.input.clone(),
        out: resolve_output(out_dir, &args.out),
        ntoy: args.ntoy,
        seed: args.seed,
        fit: fit_options_from_args(&args.minimizer),
        summary: resolve_optional(out_dir, args.summary.as_deref()),
        plot_width: args.width,
        plot_height: args.height,
    }
}

pub fn scan_config_from_args(args: &ScanArgs, out_dir: Option<&Path>) -> ScanConfig {
    ScanConfig {
        input: args.input.clone(),
        nll_out: resolve_output(out_dir, &args.nll_out),
        chi2_out: resolve_output(out_dir, &args.chi2_out),
        points: args.points,
        nll_sigmas: args.nll_sigmas,
        chi2_center: args.center,
        chi2_half_width: args.half_width,
        summary: resolve_optional(out_dir, args.summary.as_deref()),
    }
}

fn resolve_optional(out_dir: Option<&Path>, path: Option<&Path>) -> Option<PathBuf> {
    path.map(|p| resolve_output(out_dir, p))
}
