//! Strategy state records
//!
//! Every strategy state embeds a [`SearchProgress`] holding the best-ever
//! solution and the generation counter. Only `tell` advances it.

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::population::population::Population;
use crate::population::reduce::argmin;

/// Best-ever tracking shared by all strategies
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Best solution seen so far (NaN-filled until the first `tell`)
    pub best_solution: Vec<f64>,
    /// Fitness of `best_solution` (`+inf` until the first `tell`)
    pub best_fitness: f64,
    /// Number of completed `tell` calls
    pub generation_counter: u64,
}

impl SearchProgress {
    /// Sentinel progress for a fresh state
    pub fn new(num_dims: usize) -> Self {
        Self {
            best_solution: vec![f64::NAN; num_dims],
            best_fitness: f64::INFINITY,
            generation_counter: 0,
        }
    }

    /// Fold one evaluated generation into the progress
    ///
    /// Keeps the smaller of the generation's best and the best-ever fitness
    /// and advances the counter by exactly one.
    pub fn observe(&self, population: &Population, fitness: &[f64]) -> Self {
        let mut next = Self {
            generation_counter: self.generation_counter + 1,
            ..self.clone()
        };
        if let Some(i) = argmin(fitness) {
            if fitness[i] < self.best_fitness {
                next.best_fitness = fitness[i];
                next.best_solution = population[i].to_vec();
            }
        }
        next
    }
}

/// Common view over concrete strategy states
pub trait StrategyState: Clone + Debug + Serialize + DeserializeOwned {
    /// Best-ever tracking
    fn progress(&self) -> &SearchProgress;

    /// Copy of this state with the progress replaced
    fn with_progress(self, progress: SearchProgress) -> Self;

    /// Best fitness seen so far
    fn best_fitness(&self) -> f64 {
        self.progress().best_fitness
    }

    /// Best solution seen so far
    fn best_solution(&self) -> &[f64] {
        &self.progress().best_solution
    }

    /// Number of completed generations
    fn generation_counter(&self) -> u64 {
        self.progress().generation_counter
    }
}
