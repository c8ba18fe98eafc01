//! Diagnostics and statistics
//!
//! Per-generation fitness statistics for ask-tell runs. All statistics use
//! the minimization convention and ignore NaN fitness values.

use serde::{Deserialize, Serialize};

use crate::population::reduce::{nan_max, nan_mean, nan_min, nan_std};
use crate::strategy::state::SearchProgress;

/// Statistics for a single generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number (completed `tell` calls)
    pub generation: u64,
    /// Best (lowest) fitness in this generation
    pub best_fitness: f64,
    /// Worst (highest) fitness in this generation
    pub worst_fitness: f64,
    /// Mean fitness
    pub mean_fitness: f64,
    /// Median fitness
    pub median_fitness: f64,
    /// Fitness standard deviation
    pub fitness_std: f64,
    /// Best fitness over the whole run
    pub best_ever: f64,
}

impl GenerationStats {
    /// Compute statistics from one generation's fitness and the progress after `tell`
    pub fn from_generation(fitness: &[f64], progress: &SearchProgress) -> Self {
        let mut finite: Vec<f64> = fitness.iter().copied().filter(|f| !f.is_nan()).collect();
        finite.sort_by(|a, b| a.total_cmp(b));

        let median = match finite.len() {
            0 => f64::NAN,
            n if n % 2 == 0 => (finite[n / 2 - 1] + finite[n / 2]) / 2.0,
            n => finite[n / 2],
        };

        Self {
            generation: progress.generation_counter,
            best_fitness: nan_min(fitness),
            worst_fitness: nan_max(fitness),
            mean_fitness: nan_mean(fitness),
            median_fitness: median,
            fitness_std: nan_std(fitness),
            best_ever: progress.best_fitness,
        }
    }
}

/// Statistics collector for an entire run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Statistics per generation
    pub generations: Vec<GenerationStats>,
}

impl EvolutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generation's statistics
    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    pub fn num_generations(&self) -> usize {
        self.generations.len()
    }

    /// Lowest fitness across all recorded generations
    pub fn best_fitness(&self) -> Option<f64> {
        self.generations
            .iter()
            .map(|g| g.best_fitness)
            .filter(|f| !f.is_nan())
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Get the history of per-generation best fitness
    pub fn best_fitness_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_fitness).collect()
    }

    /// Get the history of mean fitness values
    pub fn mean_fitness_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.mean_fitness).collect()
    }

    /// Get a summary of the run
    pub fn summary(&self) -> String {
        let best = self.best_fitness().unwrap_or(f64::INFINITY);
        let last_mean = self
            .generations
            .last()
            .map(|g| g.mean_fitness)
            .unwrap_or(f64::NAN);

        format!(
            "Run Summary:\n\
             - Generations: {}\n\
             - Best fitness: {:.6}\n\
             - Final mean: {:.6}",
            self.num_generations(),
            best,
            last_mean
        )
    }
}

pub mod prelude {
    pub use super::{EvolutionStats, GenerationStats};
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn progress(generation: u64, best: f64) -> SearchProgress {
        SearchProgress {
            best_solution: vec![0.0],
            best_fitness: best,
            generation_counter: generation,
        }
    }

    #[test]
    fn test_generation_stats() {
        let stats =
            GenerationStats::from_generation(&[30.0, 10.0, 50.0, 20.0, 40.0], &progress(3, 5.0));

        assert_eq!(stats.generation, 3);
        assert_eq!(stats.best_fitness, 10.0);
        assert_eq!(stats.worst_fitness, 50.0);
        assert_eq!(stats.mean_fitness, 30.0);
        assert_eq!(stats.median_fitness, 30.0);
        assert_relative_eq!(stats.fitness_std, 200.0f64.sqrt());
        assert_eq!(stats.best_ever, 5.0);
    }

    #[test]
    fn test_generation_stats_ignores_nan() {
        let stats = GenerationStats::from_generation(&[f64::NAN, 2.0, 4.0], &progress(1, 2.0));
        assert_eq!(stats.best_fitness, 2.0);
        assert_eq!(stats.worst_fitness, 4.0);
        assert_eq!(stats.mean_fitness, 3.0);
        assert_eq!(stats.median_fitness, 3.0);
    }

    #[test]
    fn test_evolution_stats_record() {
        let mut stats = EvolutionStats::new();
        for (i, best) in [5.0, 3.0, 4.0].into_iter().enumerate() {
            stats.record(GenerationStats::from_generation(
                &[best, best + 1.0],
                &progress(i as u64 + 1, best),
            ));
        }

        assert_eq!(stats.num_generations(), 3);
        assert_eq!(stats.best_fitness(), Some(3.0));
        assert_eq!(stats.best_fitness_history(), vec![5.0, 3.0, 4.0]);
        assert_eq!(stats.mean_fitness_history(), vec![5.5, 3.5, 4.5]);

        let summary = stats.summary();
        assert!(summary.contains("Generations: 3"));
        assert!(summary.contains("Best fitness: 3.0"));
    }
}
