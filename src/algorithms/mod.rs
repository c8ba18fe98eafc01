//! Concrete strategies
//!
//! Each strategy pairs a stateless configuration struct implementing
//! [`Strategy`](crate::strategy::Strategy) with its own `State` and `Params`
//! records.

pub mod les;
pub mod ma_es;
pub mod open_es;
pub mod sim_anneal;
pub mod simple_ga;

pub mod prelude {
    pub use super::les::*;
    pub use super::ma_es::*;
    pub use super::open_es::*;
    pub use super::sim_anneal::*;
    pub use super::simple_ga::*;
}
