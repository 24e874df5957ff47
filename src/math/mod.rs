//! Mathematical utilities: linear solves and covariance inversion.

pub mod linalg;

pub use linalg::*;
