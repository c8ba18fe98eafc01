//! Crossover operators
//!
//! This module provides crossover operators for real-valued solutions.

use rand::Rng;

use crate::operators::traits::CrossoverOperator;

/// Uniform crossover
///
/// Each gene is independently taken from parent 2 with probability
/// `crossover_rate`, otherwise from parent 1. A rate of zero copies parent 1.
#[derive(Clone, Debug)]
pub struct UniformCrossover {
    /// Probability of taking a gene from parent 2
    pub crossover_rate: f64,
}

impl UniformCrossover {
    /// Create a new uniform crossover with the given rate
    pub fn new(crossover_rate: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&crossover_rate),
            "Crossover rate must be in [0, 1]"
        );
        Self { crossover_rate }
    }
}

impl Default for UniformCrossover {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl CrossoverOperator for UniformCrossover {
    fn crossover<R: Rng>(&self, parent1: &[f64], parent2: &[f64], rng: &mut R) -> Vec<f64> {
        parent1
            .iter()
            .zip(parent2)
            .map(|(&a, &b)| {
                if rng.gen::<f64>() < self.crossover_rate {
                    b
                } else {
                    a
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::PrngKey;

    #[test]
    fn test_zero_rate_copies_parent1() {
        let crossover = UniformCrossover::new(0.0);
        let mut rng = PrngKey::new(1).rng();
        let child = crossover.crossover(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &mut rng);
        assert_eq!(child, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_full_rate_copies_parent2() {
        let crossover = UniformCrossover::new(1.0);
        let mut rng = PrngKey::new(1).rng();
        let child = crossover.crossover(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &mut rng);
        assert_eq!(child, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_genes_come_from_a_parent() {
        let crossover = UniformCrossover::default();
        let mut rng = PrngKey::new(2).rng();
        let p1 = vec![0.0; 50];
        let p2 = vec![1.0; 50];
        let child = crossover.crossover(&p1, &p2, &mut rng);
        assert!(child.iter().all(|&g| g == 0.0 || g == 1.0));
        assert!(child.contains(&0.0) && child.contains(&1.0));
    }
}
