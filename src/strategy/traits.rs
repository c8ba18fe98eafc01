//! Ask-tell strategy trait
//!
//! A strategy is a stateless description of a search algorithm (population
//! size, dimensionality, fitness shaping). All mutable search state lives in
//! the `State` value the caller threads through `init`, `ask` and `tell`;
//! every call returns a new state and never touches its inputs.

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace};

use crate::error::{EvoResult, EvolutionError};
use crate::fitness::shaping::FitnessShaper;
use crate::population::population::Population;
use crate::random::PrngKey;
use crate::strategy::state::StrategyState;

/// Population-based optimizer driven through the ask-tell protocol
///
/// Implementors provide [`Strategy::init_state`], [`Strategy::sample`] and
/// [`Strategy::update`]. The provided `init`, `ask` and `tell` wrap them
/// with shape validation, fitness shaping and best-ever tracking.
pub trait Strategy {
    /// Mutable search state, threaded by the caller
    type State: StrategyState;

    /// Static hyperparameters
    type Params: Clone + Debug + Serialize + DeserializeOwned;

    /// Registry name of this strategy
    fn name(&self) -> &'static str;

    /// Number of candidates produced per `ask`
    fn population_size(&self) -> usize;

    /// Dimensionality of each candidate
    fn num_dims(&self) -> usize;

    /// Shaping applied to fitness before `update`
    fn fitness_shaper(&self) -> &FitnessShaper;

    /// Default hyperparameters for this population size and dimensionality
    fn default_params(&self) -> Self::Params;

    /// Build the strategy-specific initial state
    fn init_state(&self, key: PrngKey, params: &Self::Params) -> EvoResult<Self::State>;

    /// Propose a population from the current state
    fn sample(
        &self,
        key: PrngKey,
        state: &Self::State,
        params: &Self::Params,
    ) -> EvoResult<(Population, Self::State)>;

    /// Strategy-specific update from the shaped fitness
    fn update(
        &self,
        key: PrngKey,
        population: &Population,
        fitness: &[f64],
        state: &Self::State,
        params: &Self::Params,
    ) -> EvoResult<Self::State>;

    /// Create a fresh state with sentinel best-tracking
    fn init(&self, key: PrngKey, params: &Self::Params) -> EvoResult<Self::State> {
        let state = self.init_state(key, params)?;
        debug!(
            strategy = self.name(),
            population_size = self.population_size(),
            num_dims = self.num_dims(),
            "initialized strategy state"
        );
        Ok(state)
    }

    /// Propose exactly `population_size` candidates
    ///
    /// Best tracking and the generation counter are left untouched.
    fn ask(
        &self,
        key: PrngKey,
        state: &Self::State,
        params: &Self::Params,
    ) -> EvoResult<(Population, Self::State)> {
        let (population, next) = self.sample(key, state, params)?;
        self.check_population(&population)?;
        trace!(
            strategy = self.name(),
            generation = state.generation_counter(),
            "sampled population"
        );
        Ok((population, next.with_progress(state.progress().clone())))
    }

    /// Absorb the fitness of the population returned by the matching `ask`
    fn tell(
        &self,
        key: PrngKey,
        population: &Population,
        fitness: &[f64],
        state: &Self::State,
        params: &Self::Params,
    ) -> EvoResult<Self::State> {
        self.check_population(population)?;
        if fitness.len() != population.len() {
            return Err(EvolutionError::FitnessLengthMismatch {
                expected: population.len(),
                actual: fitness.len(),
            });
        }

        let shaper = self.fitness_shaper();
        let shaped = shaper.apply(population, fitness)?;
        let next = self.update(key, population, &shaped, state, params)?;
        let progress = state
            .progress()
            .observe(population, &shaper.orient(fitness));

        debug!(
            strategy = self.name(),
            generation = progress.generation_counter,
            best_fitness = progress.best_fitness,
            "updated strategy state"
        );
        Ok(next.with_progress(progress))
    }

    /// Validate a population against this strategy's shape
    fn check_population(&self, population: &Population) -> EvoResult<()> {
        if population.len() != self.population_size() {
            return Err(EvolutionError::PopulationSizeMismatch {
                expected: self.population_size(),
                actual: population.len(),
            });
        }
        if population.num_dims() != self.num_dims() {
            return Err(EvolutionError::DimensionMismatch {
                expected: self.num_dims(),
                actual: population.num_dims(),
            });
        }
        Ok(())
    }
}

/// Validate the sizes every strategy constructor receives
pub fn validate_dimensions(population_size: usize, num_dims: usize) -> EvoResult<()> {
    if population_size == 0 {
        return Err(EvolutionError::Configuration(
            "Population size must be positive".to_string(),
        ));
    }
    if num_dims == 0 {
        return Err(EvolutionError::Configuration(
            "Number of dimensions must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Multiply by `decay`, never going below `limit`
pub fn exp_decay(value: f64, decay: f64, limit: f64) -> f64 {
    (value * decay).max(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::state::SearchProgress;
    use serde::Deserialize;

    /// Proposes the mean repeatedly and moves it to the generation's best
    struct Centroid {
        shaper: FitnessShaper,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct CentroidState {
        mean: Vec<f64>,
        progress: SearchProgress,
    }

    impl StrategyState for CentroidState {
        fn progress(&self) -> &SearchProgress {
            &self.progress
        }

        fn with_progress(self, progress: SearchProgress) -> Self {
            Self { progress, ..self }
        }
    }

    impl Strategy for Centroid {
        type State = CentroidState;
        type Params = ();

        fn name(&self) -> &'static str {
            "Centroid"
        }

        fn population_size(&self) -> usize {
            2
        }

        fn num_dims(&self) -> usize {
            1
        }

        fn fitness_shaper(&self) -> &FitnessShaper {
            &self.shaper
        }

        fn default_params(&self) -> Self::Params {}

        fn init_state(&self, _key: PrngKey, _params: &()) -> EvoResult<CentroidState> {
            Ok(CentroidState {
                mean: vec![0.0],
                progress: SearchProgress::new(1),
            })
        }

        fn sample(
            &self,
            _key: PrngKey,
            state: &CentroidState,
            _params: &(),
        ) -> EvoResult<(Population, CentroidState)> {
            // Tampering with progress here must not leak out of `ask`
            let tampered = state.clone().with_progress(SearchProgress {
                generation_counter: 99,
                ..state.progress.clone()
            });
            let pop = Population::from_members(vec![state.mean.clone(), state.mean.clone()])?;
            Ok((pop, tampered))
        }

        fn update(
            &self,
            _key: PrngKey,
            population: &Population,
            fitness: &[f64],
            state: &CentroidState,
            _params: &(),
        ) -> EvoResult<CentroidState> {
            let best = crate::population::reduce::argmin(fitness).unwrap_or(0);
            Ok(CentroidState {
                mean: population[best].to_vec(),
                ..state.clone()
            })
        }
    }

    #[test]
    fn test_ask_preserves_progress() {
        let strategy = Centroid {
            shaper: FitnessShaper::raw(),
        };
        let key = PrngKey::new(0);
        let state = strategy.init(key, &()).unwrap();
        let (_, after_ask) = strategy.ask(key, &state, &()).unwrap();
        assert_eq!(after_ask.generation_counter(), 0);
    }

    #[test]
    fn test_tell_counts_generations_and_tracks_best() {
        let strategy = Centroid {
            shaper: FitnessShaper::raw(),
        };
        let key = PrngKey::new(0);
        let mut state = strategy.init(key, &()).unwrap();
        let pop = Population::from_members(vec![vec![1.0], vec![2.0]]).unwrap();

        state = strategy.tell(key, &pop, &[3.0, 2.0], &state, &()).unwrap();
        state = strategy.tell(key, &pop, &[4.0, 5.0], &state, &()).unwrap();
        state = strategy.tell(key, &pop, &[6.0, 7.0], &state, &()).unwrap();

        assert_eq!(state.generation_counter(), 3);
        assert_eq!(state.best_fitness(), 2.0);
        assert_eq!(state.best_solution(), &[2.0]);
    }

    #[test]
    fn test_tell_rejects_bad_shapes() {
        let strategy = Centroid {
            shaper: FitnessShaper::raw(),
        };
        let key = PrngKey::new(0);
        let state = strategy.init(key, &()).unwrap();

        let too_many = Population::filled(3, 1, 0.0);
        assert!(matches!(
            strategy.tell(key, &too_many, &[0.0; 3], &state, &()),
            Err(EvolutionError::PopulationSizeMismatch { .. })
        ));

        let pop = Population::filled(2, 1, 0.0);
        assert!(matches!(
            strategy.tell(key, &pop, &[0.0], &state, &()),
            Err(EvolutionError::FitnessLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_best_tracking_oriented_for_minimization_when_maximizing() {
        let strategy = Centroid {
            shaper: FitnessShaper::new(
                crate::fitness::shaping::FitnessTransform::CenteredRank,
                0.0,
                true,
            )
            .unwrap(),
        };
        let key = PrngKey::new(0);
        let state = strategy.init(key, &()).unwrap();
        let pop = Population::from_members(vec![vec![1.0], vec![2.0]]).unwrap();
        let state = strategy.tell(key, &pop, &[3.0, 8.0], &state, &()).unwrap();

        // Maximizing: 8 is best and is recorded negated
        assert_eq!(state.best_fitness(), -8.0);
        assert_eq!(state.best_solution(), &[2.0]);
        assert_eq!(state.mean, vec![2.0]);
    }

    #[test]
    fn test_exp_decay_floor() {
        assert_eq!(exp_decay(1.0, 0.5, 0.0), 0.5);
        assert_eq!(exp_decay(1.0, 0.5, 0.8), 0.8);
    }

    #[test]
    fn test_validate_dimensions() {
        assert!(validate_dimensions(4, 2).is_ok());
        assert!(validate_dimensions(0, 2).is_err());
        assert!(validate_dimensions(4, 0).is_err());
    }
}
