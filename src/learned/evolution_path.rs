//! Multi-timescale evolution paths
//!
//! A path matrix has one row per solution dimension and one column per
//! decay rate `λ`; each column is an exponential moving average
//! `(1 - λ) * path + λ * diff` of the same update signal.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_dims, EvoResult, EvolutionError};

/// Batched exponential moving averages over several decay rates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPath {
    num_dims: usize,
    timescales: Vec<f64>,
}

impl EvolutionPath {
    /// Decay rates used by learned evolution strategies
    pub const LES_TIMESCALES: [f64; 3] = [0.1, 0.5, 0.9];

    /// Create paths for `num_dims` dimensions; rates must lie in `[0, 1]`
    pub fn new(num_dims: usize, timescales: Vec<f64>) -> EvoResult<Self> {
        if timescales.is_empty() || timescales.iter().any(|l| !(0.0..=1.0).contains(l)) {
            return Err(EvolutionError::Configuration(
                "Evolution path rates must be non-empty and in [0, 1]".to_string(),
            ));
        }
        Ok(Self {
            num_dims,
            timescales,
        })
    }

    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    pub fn timescales(&self) -> &[f64] {
        &self.timescales
    }

    /// Zeroed `num_dims x timescales` paths
    pub fn init(&self) -> DMatrix<f64> {
        DMatrix::zeros(self.num_dims, self.timescales.len())
    }

    /// Fold one update signal into every timescale
    pub fn update(&self, paths: &DMatrix<f64>, diff: &[f64]) -> EvoResult<DMatrix<f64>> {
        ensure_dims(self.num_dims, diff.len())?;
        if paths.shape() != (self.num_dims, self.timescales.len()) {
            return Err(EvolutionError::DimensionMismatch {
                expected: self.num_dims * self.timescales.len(),
                actual: paths.len(),
            });
        }
        Ok(DMatrix::from_fn(self.num_dims, self.timescales.len(), |i, k| {
            let lr = self.timescales[k];
            (1.0 - lr) * paths[(i, k)] + lr * diff[i]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_init_shape() {
        let path = EvolutionPath::new(4, EvolutionPath::LES_TIMESCALES.to_vec()).unwrap();
        let p = path.init();
        assert_eq!(p.shape(), (4, 3));
        assert!(p.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_update_per_timescale() {
        let path = EvolutionPath::new(2, vec![0.1, 0.5, 1.0]).unwrap();
        let p = path.update(&path.init(), &[1.0, -2.0]).unwrap();
        assert_relative_eq!(p[(0, 0)], 0.1);
        assert_relative_eq!(p[(0, 1)], 0.5);
        assert_relative_eq!(p[(0, 2)], 1.0);
        assert_relative_eq!(p[(1, 1)], -1.0);

        let p = path.update(&p, &[1.0, -2.0]).unwrap();
        assert_relative_eq!(p[(0, 0)], 0.9 * 0.1 + 0.1);
        assert_relative_eq!(p[(0, 1)], 0.75);
    }

    #[test]
    fn test_repeated_signal_converges() {
        let path = EvolutionPath::new(1, vec![0.1]).unwrap();
        let mut p = path.init();
        for _ in 0..300 {
            p = path.update(&p, &[3.0]).unwrap();
        }
        assert_relative_eq!(p[(0, 0)], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_shape_checks() {
        let path = EvolutionPath::new(2, vec![0.5]).unwrap();
        assert!(path.update(&path.init(), &[1.0]).is_err());
        assert!(path.update(&DMatrix::zeros(3, 1), &[1.0, 1.0]).is_err());
        assert!(EvolutionPath::new(2, vec![1.5]).is_err());
    }
}
