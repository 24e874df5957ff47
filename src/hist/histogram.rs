//! Fixed-width 1-D histogram.
//!
//! Binning is `[x_min, x_max)` split into `n_bins` equal bins, indexed from 0.
//! Values below the range go to the underflow counter, values at or above
//! `x_max` go to the overflow counter. Both still count as entries.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Running sums over in-range fills, used for mean/RMS.
///
/// These reflect the exact filled values rather than bin centers, so the mean
/// of a freshly generated sample does not carry the binning bias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub sum_w: f64,
    pub sum_wx: f64,
    pub sum_wx2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram1D {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    x_min: f64,
    x_max: f64,
    contents: Vec<f64>,
    #[serde(default)]
    underflow: f64,
    #[serde(default)]
    overflow: f64,
    #[serde(default)]
    entries: f64,
    /// `None` once contents were edited directly (or when the file did not carry them).
    #[serde(default)]
    moments: Option<Moments>,
}

impl Histogram1D {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        n_bins: usize,
        x_min: f64,
        x_max: f64,
    ) -> Result<Self, AppError> {
        if n_bins == 0 {
            return Err(AppError::new(2, "Histogram needs at least one bin."));
        }
        if !(x_min.is_finite() && x_max.is_finite() && x_max > x_min) {
            return Err(AppError::new(
                2,
                format!("Invalid histogram range: [{x_min}, {x_max}) (must be finite with max > min)."),
            ));
        }
        Ok(Self {
            name: name.into(),
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            x_min,
            x_max,
            contents: vec![0.0; n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0.0,
            moments: Some(Moments::default()),
        })
    }

    /// Builder-style axis labels.
    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    /// Fill a single value with unit weight.
    ///
    /// Returns the bin index when the value is in range.
    pub fn fill(&mut self, x: f64) -> Option<usize> {
        self.entries += 1.0;
        if x.is_nan() {
            return None;
        }
        match self.find_bin(x) {
            Some(i) => {
                self.contents[i] += 1.0;
                if let Some(m) = self.moments.as_mut() {
                    m.sum_w += 1.0;
                    m.sum_wx += x;
                    m.sum_wx2 += x * x;
                }
                Some(i)
            }
            None => {
                if x < self.x_min {
                    self.underflow += 1.0;
                } else {
                    self.overflow += 1.0;
                }
                None
            }
        }
    }

    /// Bin index for `x`, or `None` if `x` is outside `[x_min, x_max)`.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.x_min && x < self.x_max) {
            return None;
        }
        let i = ((x - self.x_min) / self.bin_width()) as usize;
        // Guard against `x` just below `x_max` rounding into bin `n_bins`.
        Some(i.min(self.contents.len() - 1))
    }

    /// Overwrite a bin's content. Invalidates the exact-value moments.
    pub fn set_bin_content(&mut self, i: usize, n: f64) {
        let old = self.contents[i];
        self.contents[i] = n;
        self.entries += n - old;
        self.moments = None;
    }

    /// Clear all counts, keeping the binning and labels.
    pub fn reset(&mut self) {
        self.contents.iter_mut().for_each(|c| *c = 0.0);
        self.underflow = 0.0;
        self.overflow = 0.0;
        self.entries = 0.0;
        self.moments = Some(Moments::default());
    }

    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn bin_width(&self) -> f64 {
        (self.x_max - self.x_min) / self.contents.len() as f64
    }

    pub fn bin_low_edge(&self, i: usize) -> f64 {
        self.x_min + i as f64 * self.bin_width()
    }

    pub fn bin_up_edge(&self, i: usize) -> f64 {
        self.x_min + (i + 1) as f64 * self.bin_width()
    }

    pub fn bin_center(&self, i: usize) -> f64 {
        self.x_min + (i as f64 + 0.5) * self.bin_width()
    }

    pub fn bin_content(&self, i: usize) -> f64 {
        self.contents[i]
    }

    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Number of fills (including under/overflow).
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Largest bin content.
    pub fn maximum(&self) -> f64 {
        self.contents.iter().copied().fold(0.0, f64::max)
    }

    /// Mean of the in-range values.
    pub fn mean(&self) -> f64 {
        let m = self.effective_moments();
        if m.sum_w > 0.0 { m.sum_wx / m.sum_w } else { 0.0 }
    }

    /// Standard deviation (RMS around the mean) of the in-range values.
    pub fn std_dev(&self) -> f64 {
        let m = self.effective_moments();
        if m.sum_w <= 0.0 {
            return 0.0;
        }
        let mean = m.sum_wx / m.sum_w;
        (m.sum_wx2 / m.sum_w - mean * mean).max(0.0).sqrt()
    }

    fn effective_moments(&self) -> Moments {
        match self.moments {
            Some(m) if m.sum_w > 0.0 => m,
            _ => {
                let mut m = Moments::default();
                for (i, &n) in self.contents.iter().enumerate() {
                    let x = self.bin_center(i);
                    m.sum_w += n;
                    m.sum_wx += n * x;
                    m.sum_wx2 += n * x * x;
                }
                m
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_routes_out_of_range_values() {
        let mut h = Histogram1D::new("h", "t", 10, 0.0, 10.0).unwrap();
        assert_eq!(h.fill(-0.1), None);
        assert_eq!(h.fill(0.0), Some(0));
        assert_eq!(h.fill(9.999), Some(9));
        assert_eq!(h.fill(10.0), None);
        assert_eq!(h.underflow(), 1.0);
        assert_eq!(h.overflow(), 1.0);
        assert_eq!(h.entries(), 4.0);
        assert_eq!(h.integral(), 2.0);
    }

    #[test]
    fn mean_uses_exact_values_when_filled() {
        let mut h = Histogram1D::new("h", "t", 10, 0.0, 10.0).unwrap();
        h.fill(1.2);
        h.fill(2.2);
        assert!((h.mean() - 1.7).abs() < 1e-12);
        assert!((h.std_dev() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mean_falls_back_to_bin_centers_after_edit() {
        let mut h = Histogram1D::new("h", "t", 4, 0.0, 4.0).unwrap();
        h.set_bin_content(1, 2.0);
        h.set_bin_content(3, 2.0);
        // centers 1.5 and 3.5, equal weights
        assert!((h.mean() - 2.5).abs() < 1e-12);
        assert!((h.std_dev() - 1.0).abs() < 1e-12);
        assert_eq!(h.entries(), 4.0);
        assert_eq!(h.maximum(), 2.0);
    }

    #[test]
    fn reset_clears_counts_and_restores_exact_moments() {
        let mut h = Histogram1D::new("h", "t", 10, 0.0, 10.0).unwrap();
        h.fill(-1.0);
        h.fill(3.3);
        h.fill(12.0);
        h.set_bin_content(7, 5.0);

        h.reset();
        assert!(h.contents().iter().all(|&c| c == 0.0));
        assert_eq!((h.underflow(), h.overflow(), h.entries()), (0.0, 0.0, 0.0));
        assert_eq!(h.n_bins(), 10);

        h.fill(4.2);
        h.fill(6.2);
        // Exact values again, not the bin centers 4.5 and 6.5.
        assert!((h.mean() - 5.2).abs() < 1e-12);
        assert_eq!(h.entries(), 2.0);
    }

    #[test]
    fn edges_and_centers() {
        let h = Histogram1D::new("h", "t", 100, 0.0, 100.0).unwrap();
        assert_eq!(h.bin_width(), 1.0);
        assert_eq!(h.bin_low_edge(49), 49.0);
        assert_eq!(h.bin_up_edge(49), 50.0);
        assert_eq!(h.bin_center(49), 49.5);
    }

    #[test]
    fn rejects_bad_binning() {
        assert_eq!(Histogram1D::new("h", "t", 0, 0.0, 1.0).unwrap_err().exit_code(), 2);
        assert!(Histogram1D::new("h", "t", 5, 1.0, 1.0).is_err());
        assert!(Histogram1D::new("h", "t", 5, 0.0, f64::INFINITY).is_err());
    }
}
