//! Explicit random keys
//!
//! Every stochastic operation consumes a caller-supplied [`PrngKey`] and
//! splits it when it needs several independent draws. No global generator
//! is ever consulted, so a run is reproducible from its initial key.

mod key;

pub use key::*;

pub mod prelude {
    pub use super::key::*;
}
