//! `histfit` library crate.
//!
//! The binary (`histfit`) is a thin wrapper around this library so that:
//!
//! - fitting and analysis logic is testable without spawning processes
//! - the fitter and statistics can be driven from other tools
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod hist;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod stats;
