//! Learned Evolution Strategy
//!
//! A diagonal Gaussian search whose recombination weights come from
//! self-attention over fitness features and whose mean and step-size
//! learning rates are emitted per dimension by a policy conditioned on
//! evolution paths and a progress-time embedding.
//!
//! Reference: Lange et al. (2023). Discovering Evolution Strategies via
//! Meta-Black-Box Optimization. ICLR.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_dims, EvoResult, EvolutionError};
use crate::fitness::features::FitnessFeatures;
use crate::fitness::shaping::FitnessShaper;
use crate::learned::attention::AttentionWeights;
use crate::learned::evolution_path::EvolutionPath;
use crate::learned::lr_modulation::{EvoPathMlp, LearningRatePolicy};
use crate::learned::time_embedding::TimeEmbedding;
use crate::population::population::Population;
use crate::random::PrngKey;
use crate::strategy::state::{SearchProgress, StrategyState};
use crate::strategy::traits::{validate_dimensions, Strategy};

/// Seed of the networks built by [`Les::new`]
const DEFAULT_NETWORK_SEED: u64 = 0;

/// Hyperparameters for [`Les`], including the network weights
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LesParams<P> {
    pub std_init: f64,
    pub init_min: f64,
    pub init_max: f64,
    pub clip_min: f64,
    pub clip_max: f64,
    /// Recombination weighting over fitness features
    pub attention: AttentionWeights,
    /// Learning-rate policy
    pub lr_policy: P,
}

/// Search state of [`Les`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LesState {
    pub mean: Vec<f64>,
    /// Per-dimension step size
    pub std: Vec<f64>,
    /// `num_dims x timescales` evolution path of the mean update
    pub path_mean: DMatrix<f64>,
    /// `num_dims x timescales` evolution path of the normalized update
    pub path_std: DMatrix<f64>,
    pub progress: SearchProgress,
}

impl StrategyState for LesState {
    fn progress(&self) -> &SearchProgress {
        &self.progress
    }

    fn with_progress(self, progress: SearchProgress) -> Self {
        Self { progress, ..self }
    }
}

/// Learned evolution strategy over a pluggable learning-rate policy
#[derive(Clone, Debug)]
pub struct Les<P = EvoPathMlp> {
    population_size: usize,
    num_dims: usize,
    fitness_shaper: FitnessShaper,
    fitness_features: FitnessFeatures,
    evolution_path: EvolutionPath,
    time_embedding: TimeEmbedding,
    attention: AttentionWeights,
    lr_policy: P,
}

impl Les<EvoPathMlp> {
    /// LES with seeded, untrained attention and MLP policy
    pub fn new(population_size: usize, num_dims: usize) -> EvoResult<Self> {
        let [key_attention, key_policy] = PrngKey::new(DEFAULT_NETWORK_SEED).split_n();
        let features = Self::default_features();
        let time_embedding = TimeEmbedding::default();
        let attention = AttentionWeights::new(
            key_attention,
            features.num_features(),
            AttentionWeights::DEFAULT_HIDDEN_DIMS,
        );
        let policy = EvoPathMlp::new(
            key_policy,
            EvolutionPath::LES_TIMESCALES.len(),
            time_embedding.dim(),
            EvoPathMlp::DEFAULT_HIDDEN_DIMS,
        );
        Les::with_networks(population_size, num_dims, attention, policy)
    }
}

impl<P: LearningRatePolicy> Les<P> {
    /// LES with explicit networks
    pub fn with_networks(
        population_size: usize,
        num_dims: usize,
        attention: AttentionWeights,
        lr_policy: P,
    ) -> EvoResult<Self> {
        validate_dimensions(population_size, num_dims)?;
        let fitness_features = Self::default_features();
        if attention.num_features() != fitness_features.num_features() {
            return Err(EvolutionError::Configuration(format!(
                "Attention expects {} features, LES produces {}",
                attention.num_features(),
                fitness_features.num_features()
            )));
        }
        Ok(Self {
            population_size,
            num_dims,
            fitness_shaper: FitnessShaper::raw(),
            fitness_features,
            evolution_path: EvolutionPath::new(num_dims, EvolutionPath::LES_TIMESCALES.to_vec())?,
            time_embedding: TimeEmbedding::default(),
            attention,
            lr_policy,
        })
    }

    /// Replace the fitness shaping
    pub fn with_fitness_shaper(mut self, fitness_shaper: FitnessShaper) -> Self {
        self.fitness_shaper = fitness_shaper;
        self
    }

    /// Improvement indicator, centered rank, z-score and best difference
    fn default_features() -> FitnessFeatures {
        FitnessFeatures {
            centered_rank: true,
            z_score: true,
            diff_best: true,
            ..Default::default()
        }
    }

    /// Start from a given mean
    pub fn init_at(&self, mean: Vec<f64>, params: &LesParams<P>) -> EvoResult<LesState> {
        ensure_dims(self.num_dims, mean.len())?;
        if !(params.std_init > 0.0) {
            return Err(EvolutionError::Configuration(format!(
                "std_init must be positive, got {}",
                params.std_init
            )));
        }
        if !(params.clip_max > 0.0) {
            return Err(EvolutionError::Configuration(format!(
                "clip_max must be positive, got {}",
                params.clip_max
            )));
        }
        if params.clip_min > params.clip_max {
            return Err(EvolutionError::Configuration(
                "clip_min must not exceed clip_max".to_string(),
            ));
        }
        Ok(LesState {
            mean,
            std: vec![params.std_init; self.num_dims],
            path_mean: self.evolution_path.init(),
            path_std: self.evolution_path.init(),
            progress: SearchProgress::new(self.num_dims),
        })
    }
}

impl<P: LearningRatePolicy> Strategy for Les<P> {
    type State = LesState;
    type Params = LesParams<P>;

    fn name(&self) -> &'static str {
        "LES"
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

    fn default_params(&self) -> LesParams<P> {
        LesParams {
            std_init: 1.0,
            init_min: 0.0,
            init_max: 0.0,
            clip_min: f64::MIN,
            clip_max: f64::MAX,
            attention: self.attention.clone(),
            lr_policy: self.lr_policy.clone(),
        }
    }

    fn init_state(&self, key: PrngKey, params: &LesParams<P>) -> EvoResult<LesState> {
        self.init_at(
            key.uniform_vec(self.num_dims, params.init_min, params.init_max),
            params,
        )
    }

    fn sample(
        &self,
        key: PrngKey,
        state: &LesState,
        _params: &LesParams<P>,
    ) -> EvoResult<(Population, LesState)> {
        ensure_dims(self.num_dims, state.mean.len())?;
        ensure_dims(self.num_dims, state.std.len())?;
        let z = key.normal_matrix(self.population_size, self.num_dims);
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
        state: &LesState,
        params: &LesParams<P>,
    ) -> EvoResult<LesState> {
        ensure_dims(self.num_dims, state.mean.len())?;
        ensure_dims(self.num_dims, state.std.len())?;
        let features = self
            .fitness_features
            .apply(population, fitness, state.progress.best_fitness)?;
        let weights = params.attention.apply(&features)?;

        // Weighted moments of the generation around the current mean
        let n = self.num_dims;
        let weighted_mean = population.weighted_sum(weights.as_slice());
        let mut weight_diff = vec![0.0; n];
        let mut weight_noise = vec![0.0; n];
        let mut weighted_var = vec![0.0; n];
        for (x, w) in population.iter().zip(weights.iter()) {
            for j in 0..n {
                let diff = x[j] - state.mean[j];
                weight_diff[j] += w * diff;
                // A collapsed dimension contributes no normalized step
                if state.std[j] > 0.0 {
                    weight_noise[j] += w * diff / state.std[j];
                }
                weighted_var[j] += w * diff * diff;
            }
        }

        let path_mean = self.evolution_path.update(&state.path_mean, &weight_diff)?;
        let path_std = self.evolution_path.update(&state.path_std, &weight_noise)?;

        let time_embedding = self
            .time_embedding
            .embed(state.progress.generation_counter as f64);
        let (lrs_mean, lrs_std) =
            params.lr_policy.learning_rates(&path_mean, &path_std, &time_embedding)?;
        ensure_dims(n, lrs_mean.len())?;
        ensure_dims(n, lrs_std.len())?;

        let mean = (0..n)
            .map(|j| {
                let m = state.mean[j] + lrs_mean[j] * (weighted_mean[j] - state.mean[j]);
                m.max(params.clip_min).min(params.clip_max)
            })
            .collect();
        let std = (0..n)
            .map(|j| {
                let target = (weighted_var[j] + 1e-10).sqrt();
                let s = state.std[j] + lrs_std[j] * (target - state.std[j]);
                s.max(0.0).min(params.clip_max)
            })
            .collect();

        Ok(LesState {
            mean,
            std,
            path_mean,
            path_std,
            progress: state.progress.clone(),
        })
    }
}
