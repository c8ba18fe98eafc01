//! OpenAI Evolution Strategy
//!
//! Salimans et al. (2017). Estimates the gradient of the expected fitness
//! under an isotropic Gaussian perturbation of the mean and follows it
//! with a first-order optimizer.
//!
//! Reference: <https://arxiv.org/abs/1703.03864>

use serde::{Deserialize, Serialize};

use crate::error::{ensure_dims, EvoResult, EvolutionError};
use crate::fitness::shaping::FitnessShaper;
use crate::optimizer::{GradientOptimizer, OptimizerState};
use crate::population::population::Population;
use crate::random::PrngKey;
use crate::strategy::state::{SearchProgress, StrategyState};
use crate::strategy::traits::{exp_decay, validate_dimensions, Strategy};

/// Hyperparameters for [`OpenEs`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenEsParams {
    pub optimizer: GradientOptimizer,
    pub lrate_init: f64,
    pub lrate_decay: f64,
    pub lrate_limit: f64,
    pub std_init: f64,
    pub std_decay: f64,
    pub std_limit: f64,
    pub init_min: f64,
    pub init_max: f64,
}

impl Default for OpenEsParams {
    fn default() -> Self {
        Self {
            optimizer: GradientOptimizer::adam(),
            lrate_init: 0.05,
            lrate_decay: 1.0,
            lrate_limit: 0.001,
            std_init: 0.03,
            std_decay: 1.0,
            std_limit: 0.01,
            init_min: 0.0,
            init_max: 0.0,
        }
    }
}

/// Search state of [`OpenEs`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenEsState {
    pub mean: Vec<f64>,
    /// Per-dimension perturbation scale
    pub std: Vec<f64>,
    /// Optimizer moments and current learning rate
    pub optimizer: OptimizerState,
    pub progress: SearchProgress,
}

impl StrategyState for OpenEsState {
    fn progress(&self) -> &SearchProgress {
        &self.progress
    }

    fn with_progress(self, progress: SearchProgress) -> Self {
        Self { progress, ..self }
    }
}

/// OpenAI-ES with optional antithetic sampling
#[derive(Clone, Debug)]
pub struct OpenEs {
    population_size: usize,
    num_dims: usize,
    antithetic: bool,
    fitness_shaper: FitnessShaper,
}

impl OpenEs {
    /// Create an antithetic OpenAI-ES; the population size must be even
    pub fn new(population_size: usize, num_dims: usize) -> EvoResult<Self> {
        Self::with_sampling(population_size, num_dims, true)
    }

    /// Create with antithetic sampling switched on or off
    pub fn with_sampling(population_size: usize, num_dims: usize, antithetic: bool) -> EvoResult<Self> {
        validate_dimensions(population_size, num_dims)?;
        if antithetic && population_size % 2 != 0 {
            return Err(EvolutionError::Configuration(format!(
                "Antithetic sampling requires an even population size, got {population_size}"
            )));
        }
        Ok(Self {
            population_size,
            num_dims,
            antithetic,
            fitness_shaper: FitnessShaper::raw(),
        })
    }

    /// Replace the fitness shaping
    pub fn with_fitness_shaper(mut self, fitness_shaper: FitnessShaper) -> Self {
        self.fitness_shaper = fitness_shaper;
        self
    }

    pub fn antithetic(&self) -> bool {
        self.antithetic
    }

    /// Start from a given mean
    pub fn init_at(&self, mean: Vec<f64>, params: &OpenEsParams) -> EvoResult<OpenEsState> {
        ensure_dims(self.num_dims, mean.len())?;
        if !(params.std_init > 0.0) {
            return Err(EvolutionError::Configuration(
                "std_init must be positive".to_string(),
            ));
        }
        Ok(OpenEsState {
            mean,
            std: vec![params.std_init; self.num_dims],
            optimizer: params.optimizer.init(self.num_dims, params.lrate_init),
            progress: SearchProgress::new(self.num_dims),
        })
    }
}

impl Strategy for OpenEs {
    type State = OpenEsState;
    type Params = OpenEsParams;

    fn name(&self) -> &'static str {
        "OpenES"
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

    fn default_params(&self) -> OpenEsParams {
        OpenEsParams::default()
    }

    fn init_state(&self, key: PrngKey, params: &OpenEsParams) -> EvoResult<OpenEsState> {
        self.init_at(
            key.uniform_vec(self.num_dims, params.init_min, params.init_max),
            params,
        )
    }

    fn sample(
        &self,
        key: PrngKey,
        state: &OpenEsState,
        _params: &OpenEsParams,
    ) -> EvoResult<(Population, OpenEsState)> {
        ensure_dims(self.num_dims, state.mean.len())?;
        ensure_dims(self.num_dims, state.std.len())?;
        let z = if self.antithetic {
            let half = key.normal_matrix(self.population_size / 2, self.num_dims);
            let mirrored: Vec<Vec<f64>> = half
                .iter()
                .map(|row| row.iter().map(|v| -v).collect())
                .collect();
            half.into_iter().chain(mirrored).collect()
        } else {
            key.normal_matrix(self.population_size, self.num_dims)
        };

        let population = Population::from_fn(self.population_size, self.num_dims, |i, j| {
            state.mean[j] + state.std[j] * z[i][j]
        });
        Ok((population, state.clone()))
    }

    fn update(
        &self,
        _key: PrngKey,
        population: &Population,
        fitness: &[f64],
        state: &OpenEsState,
        params: &OpenEsParams,
    ) -> EvoResult<OpenEsState> {
        for len in [
            state.mean.len(),
            state.std.len(),
            state.optimizer.m.len(),
            state.optimizer.v.len(),
        ] {
            ensure_dims(self.num_dims, len)?;
        }
        let n = population.len() as f64;
        let grad: Vec<f64> = (0..self.num_dims)
            .map(|j| {
                let dot: f64 = population
                    .iter()
                    .zip(fitness)
                    .map(|(x, f)| (x[j] - state.mean[j]) / state.std[j] * f)
                    .sum();
                dot / (n * state.std[j])
            })
            .collect();

        let (mean, mut optimizer) = params.optimizer.step(&state.mean, &grad, &state.optimizer);
        optimizer.lrate = exp_decay(optimizer.lrate, params.lrate_decay, params.lrate_limit);

        Ok(OpenEsState {
            mean,
            std: state
                .std
                .iter()
                .map(|s| exp_decay(*s, params.std_decay, params.std_limit))
                .collect(),
            optimizer,
            progress: state.progress.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::benchmarks::Sphere;
    use crate::fitness::shaping::FitnessTransform;
    use crate::fitness::traits::Problem;
    use approx::assert_relative_eq;

    #[test]
    fn test_odd_population_rejected() {
        assert!(matches!(
            OpenEs::new(5, 2),
            Err(EvolutionError::Configuration(_))
        ));
        assert!(OpenEs::with_sampling(5, 2, false).is_ok());
    }

    #[test]
    fn test_antithetic_pairs_mirror_mean() {
        let es = OpenEs::new(6, 3).unwrap();
        let params = OpenEsParams::default();
        let state = es.init_at(vec![1.0, 2.0, 3.0], &params).unwrap();
        let (population, _) = es.ask(PrngKey::new(4), &state, &params).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                let sum = population[i][j] + population[i + 3][j];
                assert_relative_eq!(sum, 2.0 * state.mean[j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_short_state_vectors_are_dimension_mismatch() {
        let es = OpenEs::new(4, 3).unwrap();
        let params = OpenEsParams::default();
        let state = es.init_at(vec![0.0; 3], &params).unwrap();
        let (population, _) = es.ask(PrngKey::new(0), &state, &params).unwrap();
        let fitness = [1.0, 2.0, 3.0, 4.0];

        let mut short_std = state.clone();
        short_std.std.pop();
        assert!(matches!(
            es.ask(PrngKey::new(1), &short_std, &params),
            Err(EvolutionError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            es.tell(PrngKey::new(1), &population, &fitness, &short_std, &params),
            Err(EvolutionError::DimensionMismatch { expected: 3, actual: 2 })
        ));

        let mut short_moments = state;
        short_moments.optimizer.m.clear();
        assert!(matches!(
            es.tell(PrngKey::new(1), &population, &fitness, &short_moments, &params),
            Err(EvolutionError::DimensionMismatch { expected: 3, actual: 0 })
        ));
    }

    #[test]
    fn test_gradient_step_with_sgd() {
        let es = OpenEs::new(2, 1).unwrap();
        let params = OpenEsParams {
            optimizer: GradientOptimizer::sgd(),
            lrate_init: 1.0,
            lrate_decay: 0.5,
            lrate_limit: 0.0,
            std_init: 1.0,
            std_decay: 0.5,
            std_limit: 0.0,
            ..Default::default()
        };
        let key = PrngKey::new(9);
        let state = es.init_at(vec![0.0], &params).unwrap();
        let (population, state) = es.ask(key, &state, &params).unwrap();
        let z = population[0][0];

        // Fitness [1, -1] on [z, -z] gives grad = z, one unit SGD step
        let state = es.tell(key, &population, &[1.0, -1.0], &state, &params).unwrap();
        assert_relative_eq!(state.mean[0], -z, epsilon = 1e-12);
        assert_relative_eq!(state.optimizer.lrate, 0.5);
        assert_relative_eq!(state.std[0], 0.5);
    }

    #[test]
    fn test_descends_sphere() {
        let es = OpenEs::new(40, 3)
            .unwrap()
            .with_fitness_shaper(FitnessShaper::with_transform(FitnessTransform::CenteredRank));
        let params = OpenEsParams {
            std_init: 0.1,
            std_limit: 0.01,
            ..Default::default()
        };
        let problem = Sphere::new(3);
        let mut state = es.init_at(vec![2.0, -2.0, 2.0], &params).unwrap();
        let start = problem.evaluate(&state.mean);

        let mut key = PrngKey::new(0);
        for _ in 0..200 {
            let [next, ask_key, tell_key] = key.split_n();
            key = next;
            let (population, s) = es.ask(ask_key, &state, &params).unwrap();
            let fitness = problem.evaluate_population(&population);
            state = es.tell(tell_key, &population, &fitness, &s, &params).unwrap();
        }
        assert!(problem.evaluate(&state.mean) < 0.1 * start);
    }
}
