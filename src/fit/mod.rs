//! Gaussian fitting.
//!
//! Responsibilities:
//!
//! - binned chi-square and Poisson likelihood costs (`cost`)
//! - Levenberg–Marquardt minimization and covariance estimation (`fitter`)

pub mod cost;
pub mod fitter;

pub use cost::*;
pub use fitter::*;
