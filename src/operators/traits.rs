//! Operator traits
//!
//! This module defines the core operator traits for genetic search over
//! real-valued solutions.

use rand::Rng;

/// Selection operator trait
///
/// Selects parents from an evaluated population (minimization).
pub trait SelectionOperator: Send + Sync {
    /// Select a single member, returning its index
    fn select<R: Rng>(&self, fitness: &[f64], rng: &mut R) -> usize;

    /// Select multiple members independently, with replacement
    fn select_many<R: Rng>(&self, fitness: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
        (0..count).map(|_| self.select(fitness, rng)).collect()
    }
}

/// Crossover operator trait
///
/// Combines genes of two parents into one child.
pub trait CrossoverOperator: Send + Sync {
    /// Produce a child from two equally sized parents
    fn crossover<R: Rng>(&self, parent1: &[f64], parent2: &[f64], rng: &mut R) -> Vec<f64>;
}

/// Mutation operator trait
///
/// Applies random changes to a solution.
pub trait MutationOperator: Send + Sync {
    /// Apply mutation to a solution in place
    fn mutate<R: Rng>(&self, solution: &mut [f64], rng: &mut R);
}
