//! Problem traits
//!
//! This module defines the objective evaluation interface. The library
//! never evaluates objectives on its own; callers hand a [`Problem`] the
//! population returned by `ask` and pass the scores on to `tell`.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::population::population::Population;

/// Objective to be minimized
#[cfg(feature = "parallel")]
pub trait Problem: Send + Sync {
    /// Dimensionality of the search space
    fn num_dims(&self) -> usize;

    /// Evaluate one solution (lower is better)
    fn evaluate(&self, solution: &[f64]) -> f64;

    /// Evaluate every member, index-aligned with the population
    fn evaluate_population(&self, population: &Population) -> Vec<f64> {
        population
            .members()
            .par_iter()
            .map(|m| self.evaluate(m))
            .collect()
    }
}

/// Objective to be minimized
#[cfg(not(feature = "parallel"))]
pub trait Problem {
    /// Dimensionality of the search space
    fn num_dims(&self) -> usize;

    /// Evaluate one solution (lower is better)
    fn evaluate(&self, solution: &[f64]) -> f64;

    /// Evaluate every member, index-aligned with the population
    fn evaluate_population(&self, population: &Population) -> Vec<f64> {
        population.iter().map(|m| self.evaluate(m)).collect()
    }
}

/// Adapter turning a closure into a [`Problem`]
#[derive(Clone, Debug)]
pub struct FnProblem<F> {
    num_dims: usize,
    f: F,
}

impl<F> FnProblem<F>
where
    F: Fn(&[f64]) -> f64,
{
    /// Wrap `f` as a problem over `num_dims` dimensions
    pub fn new(num_dims: usize, f: F) -> Self {
        Self { num_dims, f }
    }
}

#[cfg(feature = "parallel")]
impl<F> Problem for FnProblem<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn num_dims(&self) -> usize {
        self.num_dims
    }

    fn evaluate(&self, solution: &[f64]) -> f64 {
        (self.f)(solution)
    }
}

#[cfg(not(feature = "parallel"))]
impl<F> Problem for FnProblem<F>
where
    F: Fn(&[f64]) -> f64,
{
    fn num_dims(&self) -> usize {
        self.num_dims
    }

    fn evaluate(&self, solution: &[f64]) -> f64 {
        (self.f)(solution)
    }
}
