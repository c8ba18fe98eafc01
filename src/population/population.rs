//! Population type
//!
//! This module provides the Population batch: an ordered set of equally
//! sized solution vectors, index-aligned with a fitness batch.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::population::reduce::nan_mean;

/// A batch of candidate solutions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Population {
    /// The members, one solution vector each
    members: Vec<Vec<f64>>,
    /// Dimensionality shared by every member
    num_dims: usize,
}

impl Population {
    /// Create a population from member vectors
    ///
    /// Fails if the batch is empty or the members differ in length.
    pub fn from_members(members: Vec<Vec<f64>>) -> EvoResult<Self> {
        let num_dims = members
            .first()
            .map(Vec::len)
            .ok_or(EvolutionError::EmptyPopulation)?;
        if let Some(bad) = members.iter().find(|m| m.len() != num_dims) {
            return Err(EvolutionError::DimensionMismatch {
                expected: num_dims,
                actual: bad.len(),
            });
        }
        Ok(Self { members, num_dims })
    }

    /// Create a population where every gene holds the same value
    pub fn filled(size: usize, num_dims: usize, value: f64) -> Self {
        Self {
            members: vec![vec![value; num_dims]; size],
            num_dims,
        }
    }

    /// Build a population gene by gene from `f(member, dim)`
    pub fn from_fn<F>(size: usize, num_dims: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let members = (0..size)
            .map(|i| (0..num_dims).map(|j| f(i, j)).collect())
            .collect();
        Self { members, num_dims }
    }

    /// Get the population size
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the population is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Dimensionality of each member
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Get a member by index
    pub fn get(&self, index: usize) -> Option<&[f64]> {
        self.members.get(index).map(Vec::as_slice)
    }

    /// Iterate over the members in order
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.members.iter().map(Vec::as_slice)
    }

    /// Get the underlying member vectors
    pub fn members(&self) -> &[Vec<f64>] {
        &self.members
    }

    /// Take the member vectors out of this population
    pub fn into_members(self) -> Vec<Vec<f64>> {
        self.members
    }

    /// Weighted sum over members: `Σ wᵢ xᵢ`
    pub fn weighted_sum(&self, weights: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.num_dims];
        for (member, &w) in self.members.iter().zip(weights) {
            for (acc, &x) in out.iter_mut().zip(member) {
                *acc += w * x;
            }
        }
        out
    }

    /// Mean of squared genes per member, ignoring NaNs
    pub fn mean_squares(&self) -> Vec<f64> {
        self.members
            .iter()
            .map(|m| nan_mean(&m.iter().map(|x| x * x).collect::<Vec<_>>()))
            .collect()
    }
}

impl Index<usize> for Population {
    type Output = [f64];

    fn index(&self, index: usize) -> &Self::Output {
        &self.members[index]
    }
}
