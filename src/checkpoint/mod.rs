//! Checkpointing of strategy runs
//!
//! A run is fully described by its State/Params pair, so saving both lets a
//! search resume at the same generation with the same next `ask`.

mod recovery;
mod state;

pub use recovery::*;
pub use state::*;

pub mod prelude {
    pub use super::recovery::*;
    pub use super::state::*;
}
