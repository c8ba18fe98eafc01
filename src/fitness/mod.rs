//! Fitness evaluation and shaping
//!
//! This module provides the problem abstraction, benchmark problems, and
//! the transforms applied to fitness between evaluation and update.

pub mod benchmarks;
pub mod features;
pub mod shaping;
pub mod traits;

pub mod prelude {
    pub use super::benchmarks::*;
    pub use super::features::*;
    pub use super::shaping::*;
    pub use super::traits::*;
}
