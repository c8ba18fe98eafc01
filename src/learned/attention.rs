//! Attention-based recombination weights
//!
//! Single-head self-attention over per-member fitness features. The output
//! replaces fixed rank-based recombination weights: one non-negative weight
//! per member, summing to one.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::learned::dense::{softmax, softmax_rows, Dense};
use crate::random::PrngKey;

/// Self-attention recombination weighting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttentionWeights {
    keys: Dense,
    queries: Dense,
    values: Dense,
}

impl AttentionWeights {
    pub const DEFAULT_HIDDEN_DIMS: usize = 8;

    /// Randomly initialized projections for `num_features` inputs
    pub fn new(key: PrngKey, num_features: usize, hidden_dims: usize) -> Self {
        let [key_k, key_q, key_v] = key.split_n();
        Self {
            keys: Dense::lecun_normal(key_k, num_features, hidden_dims),
            queries: Dense::lecun_normal(key_q, num_features, hidden_dims),
            values: Dense::lecun_normal(key_v, num_features, 1),
        }
    }

    /// Attention from explicit key, query and value projections
    pub fn from_layers(keys: Dense, queries: Dense, values: Dense) -> EvoResult<Self> {
        if keys.in_dim() != queries.in_dim() || keys.in_dim() != values.in_dim() {
            return Err(EvolutionError::Configuration(
                "Attention projections must share their input width".to_string(),
            ));
        }
        if keys.out_dim() != queries.out_dim() || values.out_dim() != 1 {
            return Err(EvolutionError::Configuration(
                "Keys and queries must match; values must project to one scalar".to_string(),
            ));
        }
        Ok(Self {
            keys,
            queries,
            values,
        })
    }

    pub fn num_features(&self) -> usize {
        self.keys.in_dim()
    }

    pub fn hidden_dims(&self) -> usize {
        self.keys.out_dim()
    }

    /// Recombination weights for a `population_size x num_features` matrix
    pub fn apply(&self, features: &DMatrix<f64>) -> EvoResult<DVector<f64>> {
        let n = features.nrows();
        if n == 0 {
            return Err(EvolutionError::EmptyPopulation);
        }
        let keys = self.keys.forward(features)?;
        let queries = self.queries.forward(features)?;
        let values = self.values.forward(features)?;

        let logits = (&queries * keys.transpose()) / (n as f64).sqrt();
        let attention = softmax_rows(&logits);
        let scores = attention * values;
        Ok(softmax(&scores.column(0).into_owned()))
    }
}
