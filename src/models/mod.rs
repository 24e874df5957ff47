//! Model implementations.
//!
//! Models are implemented as small, pure functions so that fitting/statistics
//! code can stay generic.

pub mod gaussian;

pub use gaussian::*;
