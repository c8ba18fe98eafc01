//! Matrix Adaptation Evolution Strategy
//!
//! MA-ES drops the covariance matrix of CMA-ES and adapts a transformation
//! matrix `M` directly, so sampling needs no eigendecomposition.
//!
//! Reference: Beyer, H.-G., & Sendhoff, B. (2017). Simplify Your Covariance
//! Matrix Adaptation Evolution Strategy. IEEE TEVC, 21(5).

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_dims, EvoResult, EvolutionError};
use crate::fitness::shaping::FitnessShaper;
use crate::population::population::Population;
use crate::population::reduce::argsort;
use crate::random::PrngKey;
use crate::strategy::state::{SearchProgress, StrategyState};
use crate::strategy::traits::{validate_dimensions, Strategy};

/// Hyperparameters for [`MaEs`]
///
/// Derived from the population size and dimensionality by
/// [`MaEsParams::for_problem`]; `weights` has one entry per member with
/// zeros outside the elite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaEsParams {
    /// Recombination weights by fitness rank
    pub weights: Vec<f64>,
    /// Variance effective selection mass
    pub mu_eff: f64,
    pub c_mean: f64,
    /// Cumulation constant of the step-size path
    pub c_std: f64,
    /// Step-size damping
    pub d_std: f64,
    /// Rank-one learning rate
    pub c_1: f64,
    /// Rank-mu learning rate
    pub c_mu: f64,
    /// Expected norm of a standard normal vector
    pub chi_n: f64,
    pub std_init: f64,
    pub init_min: f64,
    pub init_max: f64,
}

impl MaEsParams {
    /// Fraction of the population receiving positive weight
    pub const ELITE_RATIO: f64 = 0.5;

    /// Default constants for a population size and dimensionality
    pub fn for_problem(population_size: usize, num_dims: usize) -> Self {
        let n = num_dims as f64;
        let mu = ((population_size as f64 * Self::ELITE_RATIO) as usize).max(1);

        // Log-linear weights over the elite, normalized to one
        let log_half = ((population_size as f64 + 1.0) / 2.0).ln();
        let raw: Vec<f64> = (0..mu)
            .map(|i| (log_half - ((i + 1) as f64).ln()).max(0.0))
            .collect();
        let total: f64 = raw.iter().sum();
        let mut weights = vec![0.0; population_size];
        for (w, r) in weights.iter_mut().zip(&raw) {
            *w = if total > 0.0 { r / total } else { 1.0 / mu as f64 };
        }

        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();
        let c_std = (mu_eff + 2.0) / (n + mu_eff + 5.0);
        let d_std = 1.0 + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0) + c_std;
        let c_1 = 2.0 / ((n + 1.3).powi(2) + mu_eff);
        let c_mu = (2.0 * (mu_eff - 2.0 + 1.0 / mu_eff) / ((n + 2.0).powi(2) + mu_eff))
            .min(1.0 - c_1)
            .max(0.0);
        let chi_n = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n * n));

        Self {
            weights,
            mu_eff,
            c_mean: 1.0,
            c_std,
            d_std,
            c_1,
            c_mu,
            chi_n,
            std_init: 1.0,
            init_min: 0.0,
            init_max: 0.0,
        }
    }
}

/// Search state of [`MaEs`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaEsState {
    pub mean: Vec<f64>,
    /// Global step size
    pub std: f64,
    /// Step-size evolution path
    pub p_std: Vec<f64>,
    /// Transformation matrix
    pub m: DMatrix<f64>,
    /// Standard normal draws behind the last `ask`, one row per member
    pub z: Vec<Vec<f64>>,
    pub progress: SearchProgress,
}

impl StrategyState for MaEsState {
    fn progress(&self) -> &SearchProgress {
        &self.progress
    }

    fn with_progress(self, progress: SearchProgress) -> Self {
        Self { progress, ..self }
    }
}

/// Matrix Adaptation ES
#[derive(Clone, Debug)]
pub struct MaEs {
    population_size: usize,
    num_dims: usize,
    fitness_shaper: FitnessShaper,
}

impl MaEs {
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

    /// Start from a given mean
    pub fn init_at(&self, mean: Vec<f64>, params: &MaEsParams) -> EvoResult<MaEsState> {
        ensure_dims(self.num_dims, mean.len())?;
        if params.weights.len() != self.population_size {
            return Err(EvolutionError::PopulationSizeMismatch {
                expected: self.population_size,
                actual: params.weights.len(),
            });
        }
        Ok(MaEsState {
            mean,
            std: params.std_init,
            p_std: vec![0.0; self.num_dims],
            m: DMatrix::identity(self.num_dims, self.num_dims),
            z: vec![vec![0.0; self.num_dims]; self.population_size],
            progress: SearchProgress::new(self.num_dims),
        })
    }
}

impl Strategy for MaEs {
    type State = MaEsState;
    type Params = MaEsParams;

    fn name(&self) -> &'static str {
        "MA_ES"
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

    fn default_params(&self) -> MaEsParams {
        MaEsParams::for_problem(self.population_size, self.num_dims)
    }

    fn init_state(&self, key: PrngKey, params: &MaEsParams) -> EvoResult<MaEsState> {
        self.init_at(
            key.uniform_vec(self.num_dims, params.init_min, params.init_max),
            params,
        )
    }

    fn sample(
        &self,
        key: PrngKey,
        state: &MaEsState,
        _params: &MaEsParams,
    ) -> EvoResult<(Population, MaEsState)> {
        ensure_dims(self.num_dims, state.mean.len())?;
        ensure_dims(self.num_dims, state.m.nrows())?;
        ensure_dims(self.num_dims, state.m.ncols())?;
        let z = key.normal_matrix(self.population_size, self.num_dims);
        let members: Vec<Vec<f64>> = z
            .iter()
            .map(|row| {
                let y = &state.m * DVector::from_column_slice(row);
                state
                    .mean
                    .iter()
                    .zip(y.iter())
                    .map(|(m, y)| m + state.std * y)
                    .collect()
            })
            .collect();

        let population = Population::from_members(members)?;
        Ok((population, MaEsState { z, ..state.clone() }))
    }

    fn update(
        &self,
        _key: PrngKey,
        population: &Population,
        fitness: &[f64],
        state: &MaEsState,
        params: &MaEsParams,
    ) -> EvoResult<MaEsState> {
        if state.z.len() != population.len() || params.weights.len() != population.len() {
            return Err(EvolutionError::PopulationSizeMismatch {
                expected: population.len(),
                actual: state.z.len(),
            });
        }
        let n = self.num_dims;
        for len in [state.mean.len(), state.p_std.len(), state.m.nrows(), state.m.ncols()] {
            ensure_dims(n, len)?;
        }
        if let Some(bad) = state.z.iter().find(|z| z.len() != n) {
            return Err(EvolutionError::DimensionMismatch {
                expected: n,
                actual: bad.len(),
            });
        }
        let order = argsort(fitness);

        // Weighted recombination of sorted steps and noise
        let mut step = DVector::<f64>::zeros(n);
        let mut z_w = DVector::<f64>::zeros(n);
        let mut z_outer_w = DMatrix::<f64>::zeros(n, n);
        for (&w, &i) in params.weights.iter().zip(&order) {
            if w == 0.0 {
                continue;
            }
            let z_i = DVector::from_column_slice(&state.z[i]);
            for j in 0..n {
                step[j] += w * (population[i][j] - state.mean[j]);
            }
            z_w += &z_i * w;
            z_outer_w += (&z_i * z_i.transpose()) * w;
        }

        let mean: Vec<f64> = state
            .mean
            .iter()
            .zip(step.iter())
            .map(|(m, s)| m + params.c_mean * s)
            .collect();

        let p_std = DVector::from_column_slice(&state.p_std) * (1.0 - params.c_std)
            + z_w * (params.c_std * (2.0 - params.c_std) * params.mu_eff).sqrt();
        let norm_p_std = p_std.norm();
        let std = state.std * ((params.c_std / params.d_std) * (norm_p_std / params.chi_n - 1.0)).exp();

        let identity = DMatrix::<f64>::identity(n, n);
        let m = &state.m
            * (&identity
                + (&p_std * p_std.transpose() - &identity) * (params.c_1 / 2.0)
                + (z_outer_w - &identity) * (params.c_mu / 2.0));

        Ok(MaEsState {
            mean,
            std,
            p_std: p_std.iter().copied().collect(),
            m,
            z: state.z.clone(),
            progress: state.progress.clone(),
        })
    }
}
