//! Input/output helpers.
//!
//! - histogram files (`histo`)
//! - fit record / summary exports (`export`)

pub mod export;
pub mod histo;

pub use export::*;
pub use histo::*;
