//! Test statistics and probabilities.

pub mod statistic;

pub use statistic::*;
