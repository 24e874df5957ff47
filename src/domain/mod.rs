//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - fit configuration (`FitMethod`, `FitOptions`, `SampleSpec`)
//! - the per-fit record (`FitResults`)
//! - per-command configuration (`SweepConfig`, `ToyConfig`, ...)

pub mod types;

pub use types::*;
