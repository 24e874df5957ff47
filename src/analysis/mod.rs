//! Analysis drivers built on top of the fitter.
//!
//! - `sweep`: fit-result distributions over many samples
//! - `compare`: chi-square vs likelihood on the same small samples
//! - `toys`: toy Monte Carlo p-value of a likelihood fit
//! - `scan`: NLL / chi-square profiles over the mean

pub mod compare;
pub mod scan;
pub mod sweep;
pub mod toys;

pub use compare::*;
pub use scan::*;
pub use sweep::*;
pub use toys::*;
