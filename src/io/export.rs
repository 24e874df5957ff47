//! Export fit records and analysis summaries.
//!
//! The CSV export is meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON summaries carry toy/scan outcomes plus run metadata.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::FitResults;
use crate::error::AppError;

/// Write one CSV row per fit record.
pub fn write_results_csv(path: &Path, results: &[FitResults]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut file = BufWriter::new(file);

    // Header
    writeln!(
        file,
        "trial,method,amplitude,mean,sigma,reduced_chi2,err_amplitude,err_mean,err_sigma,chi2,ndof,prob,iterations,converged"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (i, r) in results.iter().enumerate() {
        writeln!(
            file,
            "{},{},{:.10},{:.10},{:.10},{:.10},{:.10},{:.10},{:.10},{:.10},{},{:.10},{},{}",
            i,
            format!("{:?}", r.method).to_lowercase(),
            r.amplitude,
            r.mean,
            r.sigma,
            r.reduced_chi2,
            r.errors.amplitude,
            r.errors.mean,
            r.errors.sigma,
            r.chi2,
            r.ndof,
            r.prob,
            r.iterations,
            r.converged,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    file.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct SummaryFile<'a, T: Serialize> {
    tool: &'static str,
    version: &'static str,
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    body: &'a T,
}

/// Write an analysis summary as pretty JSON with a generation timestamp.
pub fn write_summary_json<T: Serialize>(path: &Path, body: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    let doc = SummaryFile {
        tool: "histfit",
        version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now(),
        body,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))?;
    Ok(())
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
            reduced_chi2: 1.1,
            errors: ParamErrors {
                amplitude: 1.5,
                mean: 0.3,
                sigma: 0.2,
            },
            chi2: 77.0,
            ndof: 70.0,
            prob: 0.26,
            iterations: 5,
            converged: true,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_fit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits.csv");
        write_results_csv(&path, &[record(49.9), record(50.2)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("trial,method,amplitude,mean"));
        assert!(lines[1].starts_with("0,chi2,40.0000000000,49.9000000000"));
        assert!(lines[2].starts_with("1,chi2,"));
        assert!(lines[2].ends_with(",70,0.2600000000,5,true"));
    }

    #[test]
    fn csv_flags_unconverged_fits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits.csv");
        let stalled = FitResults {
            converged: false,
            ..record(48.0)
        };
        write_results_csv(&path, &[stalled]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().next().unwrap().ends_with(",iterations,converged"));
        assert!(text.lines().nth(1).unwrap().ends_with(",5,false"));
    }

    #[test]
    fn summary_json_is_flattened() {
        #[derive(Serialize)]
        struct Body {
            p_value: f64,
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_summary_json(&path, &Body { p_value: 0.25 }).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["tool"], "histfit");
        assert_eq!(value["p_value"], 0.25);
        assert!(value["generated_at"].is_string());
    }
}
