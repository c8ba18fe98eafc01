//! # evostrat
//!
//! Population-based black-box optimization through a stateless ask-tell
//! protocol.
//!
//! A strategy holds only its configuration. The caller owns the search
//! state and threads it through `init`, `ask` and `tell`, supplying an
//! explicit [`PrngKey`](random::PrngKey) for every stochastic step, so a run
//! is reproducible from its seed and can be checkpointed at any generation.
//!
//! ## Core Concepts
//!
//! - **Ask-tell**: `ask` proposes a population, the caller evaluates it,
//!   `tell` absorbs the fitness and returns the next state
//! - **Fitness shaping**: rank, z-score or range transforms applied before
//!   every update, with best tracking on the raw fitness
//! - **Minimization**: lower fitness is better; with a maximizing shaper the
//!   tracked best fitness is the negated objective
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evostrat::prelude::*;
//!
//! let strategy = SimpleGa::new(16, 4)?;
//! let params = SimpleGaParams { init_min: -5.0, init_max: 5.0, ..Default::default() };
//! let problem = Sphere::new(4);
//!
//! let mut key = PrngKey::new(42);
//! let mut state = strategy.init(key, &params)?;
//! for _ in 0..100 {
//!     let [next, ask_key, tell_key] = key.split_n();
//!     key = next;
//!     let (population, asked) = strategy.ask(ask_key, &state, &params)?;
//!     let fitness = problem.evaluate_population(&population);
//!     state = strategy.tell(tell_key, &population, &fitness, &asked, &params)?;
//! }
//! println!("best: {}", state.best_fitness());
//! ```

pub mod algorithms;
#[cfg(feature = "checkpoint")]
pub mod checkpoint;
pub mod diagnostics;
pub mod error;
pub mod fitness;
pub mod learned;
pub mod operators;
pub mod optimizer;
pub mod population;
pub mod random;
pub mod registry;
pub mod strategy;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::prelude::*;
    #[cfg(feature = "checkpoint")]
    pub use crate::checkpoint::prelude::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::error::*;
    pub use crate::fitness::prelude::*;
    pub use crate::learned::prelude::*;
    pub use crate::operators::prelude::*;
    pub use crate::optimizer::*;
    pub use crate::population::prelude::*;
    pub use crate::random::prelude::*;
    pub use crate::registry::prelude::*;
    pub use crate::strategy::prelude::*;
}
