//! Selection operators
//!
//! This module provides parent selection for genetic search.

use rand::Rng;

use crate::operators::traits::SelectionOperator;
use crate::population::reduce::argsort;

/// Uniform selection restricted to the elite subset
///
/// Members are ranked by fitness (lowest first) and parents are drawn
/// uniformly, with replacement, from the first `num_elites`. Members outside
/// the elite have zero selection probability.
#[derive(Clone, Debug)]
pub struct EliteSelection {
    /// Size of the elite subset
    pub num_elites: usize,
}

impl EliteSelection {
    /// Create a new elite selection over the best `num_elites` members
    pub fn new(num_elites: usize) -> Self {
        assert!(num_elites >= 1, "Elite size must be at least 1");
        Self { num_elites }
    }

    /// Elite count for a population size and elite ratio, at least one
    pub fn from_ratio(population_size: usize, elite_ratio: f64) -> Self {
        let num_elites = ((population_size as f64 * elite_ratio) as usize).max(1);
        Self::new(num_elites)
    }
}

impl SelectionOperator for EliteSelection {
    fn select<R: Rng>(&self, fitness: &[f64], rng: &mut R) -> usize {
        self.select_many(fitness, 1, rng)[0]
    }

    fn select_many<R: Rng>(&self, fitness: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
        assert!(!fitness.is_empty(), "Population cannot be empty");
        let order = argsort(fitness);
        let elites = &order[..self.num_elites.min(order.len())];
        (0..count)
            .map(|_| elites[rng.gen_range(0..elites.len())])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::PrngKey;

    #[test]
    fn test_only_elites_selected() {
        let fitness = [4.0, 1.0, 3.0, 2.0];
        let selection = EliteSelection::from_ratio(fitness.len(), 0.5);
        assert_eq!(selection.num_elites, 2);

        let mut rng = PrngKey::new(5).rng();
        let picks = selection.select_many(&fitness, 500, &mut rng);
        assert!(picks.iter().all(|&i| i == 1 || i == 3));
        assert!(picks.contains(&1));
        assert!(picks.contains(&3));
    }

    #[test]
    fn test_from_ratio_at_least_one() {
        assert_eq!(EliteSelection::from_ratio(1, 0.5).num_elites, 1);
        assert_eq!(EliteSelection::from_ratio(7, 0.5).num_elites, 3);
    }

    #[test]
    fn test_select_deterministic_for_key() {
        let fitness = [0.5, 0.1, 0.9, 0.3, 0.7, 0.2];
        let selection = EliteSelection::new(3);
        let a = selection.select_many(&fitness, 10, &mut PrngKey::new(9).rng());
        let b = selection.select_many(&fitness, 10, &mut PrngKey::new(9).rng());
        assert_eq!(a, b);
    }
}
