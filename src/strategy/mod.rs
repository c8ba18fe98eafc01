//! Ask-tell strategy abstraction
//!
//! This module defines the [`Strategy`] trait and the state records every
//! concrete algorithm shares.

pub mod state;
pub mod traits;

pub use state::*;
pub use traits::*;

pub mod prelude {
    pub use super::state::*;
    pub use super::traits::*;
}
