//! Simulated Annealing
//!
//! Temperature-annealed stochastic hill climbing. Each generation samples a
//! Gaussian cloud around a single incumbent; the cloud's best member replaces
//! the incumbent under the Metropolis criterion.

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::fitness::shaping::FitnessShaper;
use crate::population::population::Population;
use crate::population::reduce::argmin;
use crate::random::PrngKey;
use crate::strategy::state::{SearchProgress, StrategyState};
use crate::strategy::traits::{exp_decay, validate_dimensions, Strategy};

/// Hyperparameters for [`SimAnneal`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimAnnealParams {
    pub std_init: f64,
    pub std_decay: f64,
    pub std_limit: f64,
    pub temperature_init: f64,
    pub temperature_decay: f64,
    pub temperature_limit: f64,
    /// Scales the temperature in the acceptance probability
    pub boltzmann_constant: f64,
    pub init_min: f64,
    pub init_max: f64,
}

impl Default for SimAnnealParams {
    fn default() -> Self {
        Self {
            std_init: 1.0,
            std_decay: 1.0,
            std_limit: 0.0,
            temperature_init: 1.0,
            temperature_decay: 0.999,
            temperature_limit: 0.1,
            boltzmann_constant: 5.0,
            init_min: 0.0,
            init_max: 0.0,
        }
    }
}

impl SimAnnealParams {
    /// Check ranges of all hyperparameters
    pub fn validate(&self) -> EvoResult<()> {
        let non_negative = [
            ("std_init", self.std_init),
            ("std_limit", self.std_limit),
            ("temperature_init", self.temperature_init),
            ("temperature_limit", self.temperature_limit),
            ("boltzmann_constant", self.boltzmann_constant),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(EvolutionError::Configuration(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("std_decay", self.std_decay),
            ("temperature_decay", self.temperature_decay),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(EvolutionError::Configuration(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if self.init_min > self.init_max {
            return Err(EvolutionError::Configuration(
                "init_min must not exceed init_max".to_string(),
            ));
        }
        Ok(())
    }
}

/// Search state of [`SimAnneal`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimAnnealState {
    /// Incumbent solution
    pub current_solution: Vec<f64>,
    /// Fitness of the incumbent (`+inf` before the first `tell`)
    pub current_fitness: f64,
    /// Current perturbation scale
    pub std: f64,
    /// Current temperature
    pub temperature: f64,
    pub progress: SearchProgress,
}

impl StrategyState for SimAnnealState {
    fn progress(&self) -> &SearchProgress {
        &self.progress
    }

    fn with_progress(self, progress: SearchProgress) -> Self {
        Self { progress, ..self }
    }
}

/// Simulated annealing with population sampling
#[derive(Clone, Debug)]
pub struct SimAnneal {
    population_size: usize,
    num_dims: usize,
    fitness_shaper: FitnessShaper,
}

impl SimAnneal {
    /// Create a new annealer with raw fitness
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

    /// Start from a given incumbent
    ///
    /// The incumbent's fitness is unknown, so the first `tell` always accepts.
    pub fn init_at(&self, solution: Vec<f64>, params: &SimAnnealParams) -> EvoResult<SimAnnealState> {
        params.validate()?;
        crate::error::ensure_dims(self.num_dims, solution.len())?;
        Ok(SimAnnealState {
            current_solution: solution,
            current_fitness: f64::INFINITY,
            std: params.std_init,
            temperature: params.temperature_init,
            progress: SearchProgress::new(self.num_dims),
        })
    }
}

/// Metropolis acceptance for a change `delta` in fitness
///
/// Strict improvements are always accepted; otherwise the uniform draw `u`
/// is compared against `exp(-delta / (k * T))`.
pub fn metropolis_accept(delta: f64, temperature: f64, boltzmann_constant: f64, u: f64) -> bool {
    delta < 0.0 || u < (-delta / (boltzmann_constant * temperature)).exp()
}

impl Strategy for SimAnneal {
    type State = SimAnnealState;
    type Params = SimAnnealParams;

    fn name(&self) -> &'static str {
        "SimAnneal"
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

    fn default_params(&self) -> SimAnnealParams {
        SimAnnealParams::default()
    }

    fn init_state(&self, key: PrngKey, params: &SimAnnealParams) -> EvoResult<SimAnnealState> {
        self.init_at(
            key.uniform_vec(self.num_dims, params.init_min, params.init_max),
            params,
        )
    }

    fn sample(
        &self,
        key: PrngKey,
        state: &SimAnnealState,
        _params: &SimAnnealParams,
    ) -> EvoResult<(Population, SimAnnealState)> {
        crate::error::ensure_dims(self.num_dims, state.current_solution.len())?;
        let z = key.normal_matrix(self.population_size, self.num_dims);
        let population = Population::from_fn(self.population_size, self.num_dims, |i, j| {
            state.current_solution[j] + state.std * z[i][j]
        });
        Ok((population, state.clone()))
    }

    fn update(
        &self,
        key: PrngKey,
        population: &Population,
        fitness: &[f64],
        state: &SimAnnealState,
        params: &SimAnnealParams,
    ) -> EvoResult<SimAnnealState> {
        let mut next = SimAnnealState {
            std: exp_decay(state.std, params.std_decay, params.std_limit),
            temperature: exp_decay(
                state.temperature,
                params.temperature_decay,
                params.temperature_limit,
            ),
            ..state.clone()
        };

        // A NaN delta fails both acceptance tests
        let Some(best) = argmin(fitness) else {
            return Ok(next);
        };

        let delta = fitness[best] - state.current_fitness;
        let accept = metropolis_accept(
            delta,
            state.temperature,
            params.boltzmann_constant,
            key.uniform(),
        );
        if accept {
            next.current_solution = population[best].to_vec();
            next.current_fitness = fitness[best];
        }
        Ok(next)
    }
}
