//! Chart rendering.
//!
//! - `ascii`: fixed-size terminal plots
//! - `svg`: chart files written with Plotters

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;
