//! Pseudo-random Gaussian histogram generation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::SampleSpec;
use crate::error::AppError;
use crate::hist::Histogram1D;

pub const SAMPLE_NAME: &str = "randomHist1";
pub const SAMPLE_TITLE: &str = "Random Histogram";

/// Fill `spec.entries` draws from `N(spec.mean, spec.sigma)` into a fresh histogram.
pub fn generate_histogram(spec: &SampleSpec) -> Result<Histogram1D, AppError> {
    validate_spec(spec)?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(spec.mean, spec.sigma)
        .map_err(|e| AppError::new(2, format!("Sample distribution error: {e}")))?;

    let mut hist = Histogram1D::new(SAMPLE_NAME, SAMPLE_TITLE, spec.bins, spec.x_min, spec.x_max)?
        .with_labels("x", "frequency");
    for _ in 0..spec.entries {
        hist.fill(normal.sample(&mut rng));
    }
    Ok(hist)
}

/// Check a sample spec before any work is done.
pub fn validate_spec(spec: &SampleSpec) -> Result<(), AppError> {
    if spec.entries == 0 {
        return Err(AppError::new(2, "Entries must be > 0."));
    }
    if !(spec.mean.is_finite() && spec.sigma.is_finite() && spec.sigma > 0.0) {
        return Err(AppError::new(
            2,
            format!("Invalid generator settings: mean={}, sigma={} (sigma must be > 0).", spec.mean, spec.sigma),
        ));
    }
    if spec.bins == 0 {
        return Err(AppError::new(2, "Bins must be > 0."));
    }
    if !(spec.x_min.is_finite() && spec.x_max.is_finite() && spec.x_max > spec.x_min) {
        return Err(AppError::new(2, "Invalid histogram range for sample generation."));
    }
    Ok(())
}

/// Derive an independent seed for item `index` of a stream.
///
/// Parallel trials and toys each get their own RNG; deriving the seed from
/// `(base, stream, index)` keeps results identical regardless of how rayon
/// schedules the work.
pub fn derive_seed(base: u64, stream: &str, index: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    stream.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Sample spec for trial `index` of a sweep seeded with `base.seed`.
pub fn trial_spec(base: &SampleSpec, index: usize) -> SampleSpec {
    SampleSpec {
        seed: derive_seed(base.seed, "trial", index),
        ..base.clone()
    }
}
