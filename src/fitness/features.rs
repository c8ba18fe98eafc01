//! Fitness feature construction
//!
//! Instead of choosing one transform, [`FitnessFeatures`] concatenates
//! several fitness signals into a per-member feature matrix. Learned
//! strategies feed these rows to their recombination network.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::fitness::shaping::{centered_rank, range_norm, z_score, FITNESS_CLIP, SHAPING_EPS};
use crate::population::population::Population;
use crate::population::reduce::{nan_max, nan_min};

/// Feature matrix builder
///
/// Column order is fixed: improvement indicator, then each enabled column
/// of centered rank, z-score, best difference, range normalization and
/// squared L2 norm.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessFeatures {
    pub centered_rank: bool,
    pub z_score: bool,
    pub diff_best: bool,
    pub norm_range: bool,
    pub w_decay: f64,
    pub maximize: bool,
}

impl FitnessFeatures {
    /// Number of columns produced by [`FitnessFeatures::apply`]
    pub fn num_features(&self) -> usize {
        1 + [
            self.centered_rank,
            self.z_score,
            self.diff_best,
            self.norm_range,
            self.w_decay > 0.0,
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }

    /// Build the `population_size x num_features` matrix
    ///
    /// `best_fitness` is the best fitness seen before this generation, in
    /// the same orientation as `fitness`.
    pub fn apply(
        &self,
        population: &Population,
        fitness: &[f64],
        best_fitness: f64,
    ) -> EvoResult<DMatrix<f64>> {
        if population.len() != fitness.len() {
            return Err(EvolutionError::FitnessLengthMismatch {
                expected: population.len(),
                actual: fitness.len(),
            });
        }

        let fitness: Vec<f64> = if self.maximize {
            fitness.iter().map(|f| -f).collect()
        } else {
            fitness.to_vec()
        };

        let mut columns: Vec<Vec<f64>> = vec![fitness
            .iter()
            .map(|&f| if f < best_fitness { 1.0 } else { 0.0 })
            .collect()];

        if self.centered_rank {
            columns.push(centered_rank(&fitness));
        }
        if self.z_score {
            columns.push(z_score(&fitness));
        }
        if self.diff_best {
            columns.push(norm_diff_best(&fitness, best_fitness));
        }
        if self.norm_range {
            columns.push(range_norm(&fitness, -1.0, 1.0));
        }
        if self.w_decay > 0.0 {
            columns.push(population.mean_squares());
        }

        Ok(DMatrix::from_fn(fitness.len(), columns.len(), |i, j| {
            columns[j][i]
        }))
    }
}

/// Difference to the best-ever fitness, scaled by its own range and clipped to `[-1, 1]`
///
/// Both the batch and the best fitness are clamped to a finite range first,
/// so an unset `+inf` best yields `-1` everywhere instead of NaN.
pub fn norm_diff_best(fitness: &[f64], best_fitness: f64) -> Vec<f64> {
    let best = best_fitness.clamp(-FITNESS_CLIP, FITNESS_CLIP);
    let diff: Vec<f64> = fitness
        .iter()
        .map(|f| f.clamp(-FITNESS_CLIP, FITNESS_CLIP) - best)
        .collect();
    let range = nan_max(&diff) - nan_min(&diff) + SHAPING_EPS;
    diff.iter().map(|d| (d / range).clamp(-1.0, 1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn all_features() -> FitnessFeatures {
        FitnessFeatures {
            centered_rank: true,
            z_score: true,
            diff_best: true,
            norm_range: true,
            w_decay: 0.1,
            maximize: false,
        }
    }

    #[test]
    fn test_improvement_column_only() {
        let features = FitnessFeatures::default();
        let pop = Population::filled(3, 2, 1.0);
        let m = features.apply(&pop, &[1.0, 5.0, 2.0], 2.0).unwrap();
        assert_eq!(m.shape(), (3, 1));
        assert_eq!(m.column(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_column_order() {
        let features = all_features();
        assert_eq!(features.num_features(), 6);

        let pop = Population::from_members(vec![vec![1.0, 1.0], vec![0.0, 2.0], vec![3.0, 0.0]])
            .unwrap();
        let fitness = [2.0, 0.0, 4.0];
        let m = features.apply(&pop, &fitness, 1.0).unwrap();
        assert_eq!(m.shape(), (3, 6));

        // centered rank
        assert_relative_eq!(m[(1, 1)], -0.5);
        assert_relative_eq!(m[(2, 1)], 0.5);
        // range normalization
        assert_relative_eq!(m[(1, 4)], -1.0, epsilon = 1e-9);
        assert_relative_eq!(m[(2, 4)], 1.0, epsilon = 1e-9);
        // squared norm column
        assert_relative_eq!(m[(0, 5)], 1.0);
        assert_relative_eq!(m[(1, 5)], 2.0);
        assert_relative_eq!(m[(2, 5)], 4.5);
    }

    #[test]
    fn test_norm_diff_best_clipped() {
        let d = norm_diff_best(&[0.0, 1.0, 2.0], 1.0);
        assert_relative_eq!(d[0], -0.5, epsilon = 1e-9);
        assert_relative_eq!(d[1], 0.0);
        assert_relative_eq!(d[2], 0.5, epsilon = 1e-9);

        let d = norm_diff_best(&[0.0, 1.0, 2.0], f64::INFINITY);
        assert!(d.iter().all(|&v| v == -1.0));
    }

    #[test]
    fn test_maximize_flips_improvement() {
        let features = FitnessFeatures {
            maximize: true,
            ..Default::default()
        };
        let pop = Population::filled(2, 1, 0.0);
        // Oriented fitness is [-3, -1]; only the first beats -2
        let m = features.apply(&pop, &[3.0, 1.0], -2.0).unwrap();
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(1, 0)], 0.0);
    }
}
