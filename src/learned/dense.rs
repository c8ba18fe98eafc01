//! Dense layers and activations
//!
//! Minimal fully-connected layers holding fixed weights. Rows of the input
//! matrix are independent samples.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::random::PrngKey;

/// Affine layer `y = x W + b`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    /// `in_dim x out_dim` weights
    pub weight: DMatrix<f64>,
    /// `out_dim` bias
    pub bias: DVector<f64>,
}

impl Dense {
    /// Layer from explicit weights
    pub fn new(weight: DMatrix<f64>, bias: DVector<f64>) -> EvoResult<Self> {
        if weight.ncols() != bias.len() {
            return Err(EvolutionError::DimensionMismatch {
                expected: weight.ncols(),
                actual: bias.len(),
            });
        }
        Ok(Self { weight, bias })
    }

    /// All-zero layer
    pub fn zeros(in_dim: usize, out_dim: usize) -> Self {
        Self {
            weight: DMatrix::zeros(in_dim, out_dim),
            bias: DVector::zeros(out_dim),
        }
    }

    /// LeCun-normal weights (variance `1 / in_dim`) and zero bias
    pub fn lecun_normal(key: PrngKey, in_dim: usize, out_dim: usize) -> Self {
        let scale = 1.0 / (in_dim.max(1) as f64).sqrt();
        let z = key.normal_vec(in_dim * out_dim);
        Self {
            weight: DMatrix::from_row_slice(in_dim, out_dim, &z) * scale,
            bias: DVector::zeros(out_dim),
        }
    }

    pub fn in_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.ncols()
    }

    /// Apply to a batch of `rows x in_dim` inputs
    pub fn forward(&self, x: &DMatrix<f64>) -> EvoResult<DMatrix<f64>> {
        if x.ncols() != self.in_dim() {
            return Err(EvolutionError::DimensionMismatch {
                expected: self.in_dim(),
                actual: x.ncols(),
            });
        }
        let mut y = x * &self.weight;
        for mut row in y.row_iter_mut() {
            row += self.bias.transpose();
        }
        Ok(y)
    }
}

pub fn relu(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.map(|v| v.max(0.0))
}

pub fn sigmoid(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.map(|v| 1.0 / (1.0 + (-v).exp()))
}

/// Numerically stable softmax of a vector
pub fn softmax(x: &DVector<f64>) -> DVector<f64> {
    let max = x.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let exp = x.map(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Softmax applied to every row independently
pub fn softmax_rows(x: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = x.clone();
    for mut row in out.row_iter_mut() {
        let max = row.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        row.apply(|v| *v = (*v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    out
}
