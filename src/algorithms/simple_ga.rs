//! Simple Genetic Algorithm
//!
//! Elitist generational genetic search over real vectors. Parents are drawn
//! uniformly from the best half of the last evaluated generation, combined
//! by uniform crossover and perturbed by isotropic Gaussian mutation.

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::fitness::shaping::FitnessShaper;
use crate::operators::crossover::UniformCrossover;
use crate::operators::mutation::GaussianMutation;
use crate::operators::selection::EliteSelection;
use crate::operators::traits::{CrossoverOperator, MutationOperator, SelectionOperator};
use crate::population::population::Population;
use crate::random::PrngKey;
use crate::strategy::state::{SearchProgress, StrategyState};
use crate::strategy::traits::{exp_decay, validate_dimensions, Strategy};

/// Hyperparameters for [`SimpleGa`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleGaParams {
    /// Probability of taking each gene from the second parent
    pub crossover_rate: f64,
    /// Initial mutation scale
    pub std_init: f64,
    /// Multiplicative decay of the mutation scale per generation
    pub std_decay: f64,
    /// Floor of the mutation scale
    pub std_limit: f64,
    /// Lower bound of the uniform initial population
    pub init_min: f64,
    /// Upper bound of the uniform initial population
    pub init_max: f64,
}

impl Default for SimpleGaParams {
    fn default() -> Self {
        Self {
            crossover_rate: 0.0,
            std_init: 1.0,
            std_decay: 1.0,
            std_limit: 0.0,
            init_min: 0.0,
            init_max: 0.0,
        }
    }
}

impl SimpleGaParams {
    /// Check ranges of all hyperparameters
    pub fn validate(&self) -> EvoResult<()> {
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(EvolutionError::Configuration(format!(
                "Crossover rate must be in [0, 1], got {}",
                self.crossover_rate
            )));
        }
        if self.std_init < 0.0 || self.std_limit < 0.0 {
            return Err(EvolutionError::Configuration(
                "Mutation scale and its limit must be non-negative".to_string(),
            ));
        }
        if !(self.std_decay > 0.0 && self.std_decay <= 1.0) {
            return Err(EvolutionError::Configuration(format!(
                "Mutation decay must be in (0, 1], got {}",
                self.std_decay
            )));
        }
        if self.init_min > self.init_max {
            return Err(EvolutionError::Configuration(
                "init_min must not exceed init_max".to_string(),
            ));
        }
        Ok(())
    }
}

/// Search state of [`SimpleGa`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleGaState {
    /// Last evaluated generation
    pub population: Population,
    /// Fitness of `population`, index-aligned
    pub fitness: Vec<f64>,
    /// Current mutation scale
    pub std: f64,
    /// Best-ever tracking
    pub progress: SearchProgress,
}

impl StrategyState for SimpleGaState {
    fn progress(&self) -> &SearchProgress {
        &self.progress
    }

    fn with_progress(self, progress: SearchProgress) -> Self {
        Self { progress, ..self }
    }
}

/// Elitist genetic algorithm
#[derive(Clone, Debug)]
pub struct SimpleGa {
    population_size: usize,
    num_dims: usize,
    fitness_shaper: FitnessShaper,
}

impl SimpleGa {
    /// Fraction of the population eligible as parents
    pub const ELITE_RATIO: f64 = 0.5;

    /// Create a new genetic algorithm with raw fitness
    pub fn new(population_size: usize, num_dims: usize) -> EvoResult<Self> {
        validate_dimensions(population_size, num_dims)?;
        Ok(Self {
            population_size,
            num_dims,
            fitness_shaper: FitnessShaper::raw(),
        })
    }

    /// Replace the fitness shaping
    pub fn with_fitness_shaper(mut self, fitness_shaper: FitnessShaper) -> Self {
        self.fitness_shaper = fitness_shaper;
        self
    }

    /// Number of members eligible as parents
    pub fn num_elites(&self) -> usize {
        self.selection().num_elites
    }

    /// Start from an already evaluated population
    pub fn init_with_population(
        &self,
        population: Population,
        fitness: Vec<f64>,
        params: &SimpleGaParams,
    ) -> EvoResult<SimpleGaState> {
        params.validate()?;
        self.check_population(&population)?;
        if fitness.len() != population.len() {
            return Err(EvolutionError::FitnessLengthMismatch {
                expected: population.len(),
                actual: fitness.len(),
            });
        }
        Ok(SimpleGaState {
            population,
            fitness,
            std: params.std_init,
            progress: SearchProgress::new(self.num_dims),
        })
    }

    fn selection(&self) -> EliteSelection {
        EliteSelection::from_ratio(self.population_size, Self::ELITE_RATIO)
    }
}

impl Strategy for SimpleGa {
    type State = SimpleGaState;
    type Params = SimpleGaParams;

    fn name(&self) -> &'static str {
        "SimpleGA"
    }

    fn population_size(&self) -> usize {
        self.population_size
    }

    fn num_dims(&self) -> usize {
        self.num_dims
    }

    fn fitness_shaper(&self) -> &FitnessShaper {
        &self.fitness_shaper
    }

    fn default_params(&self) -> SimpleGaParams {
        SimpleGaParams::default()
    }

    fn init_state(&self, key: PrngKey, params: &SimpleGaParams) -> EvoResult<SimpleGaState> {
        let values = key.uniform_vec(
            self.population_size * self.num_dims,
            params.init_min,
            params.init_max,
        );
        let dims = self.num_dims;
        let population = Population::from_fn(self.population_size, dims, |i, j| values[i * dims + j]);
        self.init_with_population(population, vec![f64::INFINITY; self.population_size], params)
    }

    fn sample(
        &self,
        key: PrngKey,
        state: &SimpleGaState,
        params: &SimpleGaParams,
    ) -> EvoResult<(Population, SimpleGaState)> {
        params.validate()?;
        self.check_population(&state.population)?;

        let selection = self.selection();
        let crossover = UniformCrossover::new(params.crossover_rate);
        let mutation = GaussianMutation { std: state.std };

        let [key_crossover, key_mutation, key_1, key_2] = key.split_n();
        let parents_1 = selection.select_many(&state.fitness, self.population_size, &mut key_1.rng());
        let parents_2 = selection.select_many(&state.fitness, self.population_size, &mut key_2.rng());
        let crossover_keys = key_crossover.split(self.population_size);
        let mutation_keys = key_mutation.split(self.population_size);

        let members = parents_1
            .iter()
            .zip(&parents_2)
            .zip(crossover_keys.iter().zip(&mutation_keys))
            .map(|((&i, &j), (kc, km))| {
                let mut child = crossover.crossover(
                    &state.population[i],
                    &state.population[j],
                    &mut kc.rng(),
                );
                mutation.mutate(&mut child, &mut km.rng());
                child
            })
            .collect();

        Ok((Population::from_members(members)?, state.clone()))
    }

    fn update(
        &self,
        _key: PrngKey,
        population: &Population,
        fitness: &[f64],
        state: &SimpleGaState,
        params: &SimpleGaParams,
    ) -> EvoResult<SimpleGaState> {
        Ok(SimpleGaState {
            population: population.clone(),
            fitness: fitness.to_vec(),
            std: exp_decay(state.std, params.std_decay, params.std_limit),
            progress: state.progress.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_init_state() {
        let ga = SimpleGa::new(6, 3).unwrap();
        let params = SimpleGaParams {
            init_min: -1.0,
            init_max: 1.0,
            ..Default::default()
        };
        let state = ga.init(PrngKey::new(0), &params).unwrap();

        assert_eq!(state.population.len(), 6);
        assert_eq!(state.population.num_dims(), 3);
        assert!(state.population.iter().flatten().all(|g| (-1.0..1.0).contains(g)));
        assert!(state.fitness.iter().all(|f| *f == f64::INFINITY));
        assert_eq!(state.std, 1.0);
        assert_eq!(state.generation_counter(), 0);
        assert!(state.best_solution().iter().all(|g| g.is_nan()));
    }

    #[test]
    fn test_num_elites() {
        assert_eq!(SimpleGa::new(4, 2).unwrap().num_elites(), 2);
        assert_eq!(SimpleGa::new(9, 2).unwrap().num_elites(), 4);
        assert_eq!(SimpleGa::new(1, 2).unwrap().num_elites(), 1);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(SimpleGa::new(0, 2).is_err());
        assert!(SimpleGa::new(4, 0).is_err());

        let ga = SimpleGa::new(4, 2).unwrap();
        let params = SimpleGaParams {
            crossover_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            ga.init(PrngKey::new(0), &params),
            Err(EvolutionError::Configuration(_))
        ));
    }

    #[test]
    fn test_children_copy_elites_without_noise() {
        let ga = SimpleGa::new(4, 2).unwrap();
        let params = SimpleGaParams {
            std_init: 0.0,
            ..Default::default()
        };
        let population = Population::from_members(vec![
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
            vec![4.0, 4.0],
        ])
        .unwrap();
        let state = ga
            .init_with_population(population, vec![3.0, 0.5, 9.0, 1.0], &params)
            .unwrap();

        for seed in 0..20 {
            let (children, _) = ga.ask(PrngKey::new(seed), &state, &params).unwrap();
            for child in children.iter() {
                assert!(child == [2.0, 2.0] || child == [4.0, 4.0]);
            }
        }
    }

    #[test]
    fn test_ask_is_deterministic() {
        let ga = SimpleGa::new(8, 3).unwrap();
        let params = SimpleGaParams {
            crossover_rate: 0.5,
            init_min: -2.0,
            init_max: 2.0,
            ..Default::default()
        };
        let state = ga.init(PrngKey::new(1), &params).unwrap();
        let (a, _) = ga.ask(PrngKey::new(2), &state, &params).unwrap();
        let (b, _) = ga.ask(PrngKey::new(2), &state, &params).unwrap();
        let (c, _) = ga.ask(PrngKey::new(3), &state, &params).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_tell_stores_generation_and_decays_std() {
        let ga = SimpleGa::new(4, 2).unwrap();
        let params = SimpleGaParams {
            std_decay: 0.5,
            std_limit: 0.3,
            ..Default::default()
        };
        let key = PrngKey::new(0);
        let state = ga.init(key, &params).unwrap();
        let (population, state) = ga.ask(key, &state, &params).unwrap();
        let fitness = vec![4.0, 3.0, 2.0, 1.0];

        let state = ga.tell(key, &population, &fitness, &state, &params).unwrap();
        assert_eq!(state.population, population);
        assert_eq!(state.fitness, fitness);
        assert_relative_eq!(state.std, 0.5);
        assert_eq!(state.best_fitness(), 1.0);

        let state = ga.tell(key, &population, &fitness, &state, &params).unwrap();
        assert_relative_eq!(state.std, 0.3);
    }

    #[test]
    fn test_init_with_population_checks_shapes() {
        let ga = SimpleGa::new(2, 2).unwrap();
        let params = SimpleGaParams::default();
        let population = Population::filled(2, 2, 0.0);
        assert!(matches!(
            ga.init_with_population(population.clone(), vec![1.0], &params),
            Err(EvolutionError::FitnessLengthMismatch { .. })
        ));
        assert!(matches!(
            ga.init_with_population(Population::filled(2, 3, 0.0), vec![1.0, 2.0], &params),
            Err(EvolutionError::DimensionMismatch { .. })
        ));
        assert!(ga.init_with_population(population, vec![1.0, 2.0], &params).is_ok());
    }
}
