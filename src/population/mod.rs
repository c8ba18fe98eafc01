//! Population management
//!
//! This module provides the Population batch type and the NaN-aware
//! reductions used to rank and summarize fitness batches.

pub mod population;
pub mod reduce;

pub mod prelude {
    pub use super::population::*;
    pub use super::reduce::*;
}
