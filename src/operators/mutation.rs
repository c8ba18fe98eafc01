//! Mutation operators
//!
//! This module provides mutation operators for real-valued solutions.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::operators::traits::MutationOperator;

/// Isotropic Gaussian mutation
///
/// Adds `std * N(0, 1)` to every gene.
#[derive(Clone, Debug)]
pub struct GaussianMutation {
    /// Standard deviation of the Gaussian noise
    pub std: f64,
}

impl GaussianMutation {
    /// Create a new Gaussian mutation with the given standard deviation
    pub fn new(std: f64) -> Self {
        assert!(std >= 0.0, "Standard deviation must be non-negative");
        Self { std }
    }
}

impl MutationOperator for GaussianMutation {
    fn mutate<R: Rng>(&self, solution: &mut [f64], rng: &mut R) {
        for gene in solution.iter_mut() {
            let z: f64 = rng.sample(StandardNormal);
            *gene += self.std * z;
        }
    }
}
