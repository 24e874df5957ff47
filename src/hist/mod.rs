//! Histogram storage.

pub mod histogram;

pub use histogram::*;
