//! Read/write histogram files.
//!
//! A histogram file is JSON holding one or more histograms:
//!
//! ```json
//! { "tool": "histfit", "histograms": [ { "name": "randomHist1", ... } ] }
//! ```
//!
//! Readers take the first histogram in the file, whatever its name.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::hist::Histogram1D;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramFile {
    pub tool: String,
    #[serde(default)]
    pub histograms: Vec<Histogram1D>,
}

/// Write `histograms` to `path`, replacing any existing file.
pub fn write_histogram_file(path: &Path, histograms: &[Histogram1D]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create histogram file '{}': {e}", path.display())))?;

    let doc = HistogramFile {
        tool: "histfit".to_string(),
        histograms: histograms.to_vec(),
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write histogram file: {e}")))?;

    debug!(path = %path.display(), count = histograms.len(), "wrote histogram file");
    Ok(())
}

/// Read a histogram file.
pub fn read_histogram_file(path: &Path) -> Result<HistogramFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("ERROR: cannot open file {}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("ERROR: cannot open file {}: invalid histogram file: {e}", path.display())))
}

/// Read the first histogram stored in `path`.
pub fn read_first_histogram(path: &Path) -> Result<Histogram1D, AppError> {
    let doc = read_histogram_file(path)?;
    let hist = doc
        .histograms
        .into_iter()
        .next()
        .ok_or_else(|| AppError::new(3, format!("ERROR: no histogram found in {}", path.display())))?;
    if hist.n_bins() == 0 || !(hist.x_min().is_finite() && hist.x_max().is_finite() && hist.x_max() > hist.x_min()) {
        return Err(AppError::new(3, format!("ERROR: histogram in {} has invalid binning", path.display())));
    }
    debug!(path = %path.display(), name = %hist.name, bins = hist.n_bins(), "loaded histogram");
    Ok(hist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_keeps_first_histogram() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("histo.json");

        let mut a = Histogram1D::new("a", "first", 10, 0.0, 10.0).unwrap().with_labels("x", "frequency");
        a.fill(2.5);
        a.fill(2.7);
        a.fill(11.0);
        let b = Histogram1D::new("b", "second", 5, 0.0, 1.0).unwrap();

        write_histogram_file(&path, &[a.clone(), b]).unwrap();
        let back = read_first_histogram(&path).unwrap();
        assert_eq!(back, a);
        assert!((back.mean() - 2.6).abs() < 1e-12);
        assert_eq!(back.overflow(), 1.0);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_first_histogram(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("cannot open file"));
    }

    #[test]
    fn file_without_histograms_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, r#"{ "tool": "histfit", "histograms": [] }"#).unwrap();
        let err = read_first_histogram(&path).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("no histogram found"));
    }
}
