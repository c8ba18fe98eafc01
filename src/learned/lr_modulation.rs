//! Path-conditioned learning-rate modulation
//!
//! A policy reads the mean and step-size evolution paths together with the
//! progress-time embedding and emits, for every solution dimension, one
//! learning rate for the mean update and one for the step-size update.

use std::fmt::Debug;

use nalgebra::{DMatrix, DVector};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::learned::dense::{relu, sigmoid, Dense};
use crate::random::PrngKey;

/// Maps evolution paths and a time embedding to per-dimension learning rates
pub trait LearningRatePolicy: Clone + Debug + Serialize + DeserializeOwned {
    /// Returns `(mean_learning_rates, std_learning_rates)`, one entry per row
    /// of the path matrices
    fn learning_rates(
        &self,
        path_mean: &DMatrix<f64>,
        path_std: &DMatrix<f64>,
        time_embedding: &DVector<f64>,
    ) -> EvoResult<(DVector<f64>, DVector<f64>)>;
}

/// Two-headed MLP applied to every dimension independently
///
/// Input per dimension is `[path_mean row, path_std row, time embedding]`;
/// a ReLU hidden layer feeds two sigmoid heads, so all rates lie in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvoPathMlp {
    hidden: Dense,
    mean_head: Dense,
    std_head: Dense,
}

impl EvoPathMlp {
    pub const DEFAULT_HIDDEN_DIMS: usize = 8;

    /// Random network for paths with `num_timescales` columns
    pub fn new(key: PrngKey, num_timescales: usize, embedding_dim: usize, hidden_dims: usize) -> Self {
        let [key_hidden, key_mean, key_std] = key.split_n();
        let input_dim = 2 * num_timescales + embedding_dim;
        Self {
            hidden: Dense::lecun_normal(key_hidden, input_dim, hidden_dims),
            mean_head: Dense::lecun_normal(key_mean, hidden_dims, 1),
            std_head: Dense::lecun_normal(key_std, hidden_dims, 1),
        }
    }

    /// Network from explicit layers
    pub fn from_layers(hidden: Dense, mean_head: Dense, std_head: Dense) -> EvoResult<Self> {
        if mean_head.in_dim() != hidden.out_dim() || std_head.in_dim() != hidden.out_dim() {
            return Err(EvolutionError::Configuration(
                "Heads must read the hidden layer".to_string(),
            ));
        }
        if mean_head.out_dim() != 1 || std_head.out_dim() != 1 {
            return Err(EvolutionError::Configuration(
                "Heads must emit one scalar".to_string(),
            ));
        }
        Ok(Self {
            hidden,
            mean_head,
            std_head,
        })
    }

    /// Width of the per-dimension input row
    pub fn input_dim(&self) -> usize {
        self.hidden.in_dim()
    }
}

impl LearningRatePolicy for EvoPathMlp {
    fn learning_rates(
        &self,
        path_mean: &DMatrix<f64>,
        path_std: &DMatrix<f64>,
        time_embedding: &DVector<f64>,
    ) -> EvoResult<(DVector<f64>, DVector<f64>)> {
        if path_mean.shape() != path_std.shape() {
            return Err(EvolutionError::DimensionMismatch {
                expected: path_mean.len(),
                actual: path_std.len(),
            });
        }
        let num_dims = path_mean.nrows();
        let k = path_mean.ncols();
        let width = 2 * k + time_embedding.len();

        let x = DMatrix::from_fn(num_dims, width, |i, j| {
            if j < k {
                path_mean[(i, j)]
            } else if j < 2 * k {
                path_std[(i, j - k)]
            } else {
                time_embedding[j - 2 * k]
            }
        });

        let hidden = relu(&self.hidden.forward(&x)?);
        let lrs_mean = sigmoid(&self.mean_head.forward(&hidden)?);
        let lrs_std = sigmoid(&self.std_head.forward(&hidden)?);
        Ok((
            lrs_mean.column(0).into_owned(),
            lrs_std.column(0).into_owned(),
        ))
    }
}

/// Constant learning rates, ignoring the paths
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedLearningRates {
    pub mean: f64,
    pub std: f64,
}

impl LearningRatePolicy for FixedLearningRates {
    fn learning_rates(
        &self,
        path_mean: &DMatrix<f64>,
        _path_std: &DMatrix<f64>,
        _time_embedding: &DVector<f64>,
    ) -> EvoResult<(DVector<f64>, DVector<f64>)> {
        let n = path_mean.nrows();
        Ok((
            DVector::from_element(n, self.mean),
            DVector::from_element(n, self.std),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learned::time_embedding::tanh_timestamp;
    use approx::assert_relative_eq;

    #[test]
    fn test_rates_in_unit_interval() {
        let mlp = EvoPathMlp::new(PrngKey::new(0), 3, 13, 8);
        assert_eq!(mlp.input_dim(), 19);

        let path_mean = DMatrix::from_fn(5, 3, |i, j| (i as f64 - 2.0) * (j as f64 + 1.0));
        let path_std = DMatrix::from_element(5, 3, 0.3);
        let (lr_mean, lr_std) = mlp
            .learning_rates(&path_mean, &path_std, &tanh_timestamp(7.0))
            .unwrap();

        assert_eq!(lr_mean.len(), 5);
        assert_eq!(lr_std.len(), 5);
        assert!(lr_mean.iter().chain(lr_std.iter()).all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_zero_network_gives_half() {
        let mlp =
            EvoPathMlp::from_layers(Dense::zeros(19, 8), Dense::zeros(8, 1), Dense::zeros(8, 1))
                .unwrap();
        let paths = DMatrix::from_element(2, 3, 1.0);
        let (lr_mean, lr_std) = mlp
            .learning_rates(&paths, &paths, &tanh_timestamp(0.0))
            .unwrap();
        for v in lr_mean.iter().chain(lr_std.iter()) {
            assert_relative_eq!(*v, 0.5);
        }
    }

    #[test]
    fn test_rejects_wrong_input_width() {
        let mlp = EvoPathMlp::new(PrngKey::new(0), 3, 13, 8);
        let paths = DMatrix::zeros(2, 2);
        assert!(mlp.learning_rates(&paths, &paths, &tanh_timestamp(0.0)).is_err());
        assert!(EvoPathMlp::from_layers(Dense::zeros(4, 8), Dense::zeros(7, 1), Dense::zeros(8, 1)).is_err());
    }

    #[test]
    fn test_fixed_rates() {
        let policy = FixedLearningRates { mean: 1.0, std: 0.1 };
        let (m, s) = policy
            .learning_rates(&DMatrix::zeros(3, 3), &DMatrix::zeros(3, 3), &tanh_timestamp(0.0))
            .unwrap();
        assert_eq!(m, DVector::from_element(3, 1.0));
        assert_eq!(s, DVector::from_element(3, 0.1));
    }
}
