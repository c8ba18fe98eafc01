//! Strategy registry
//!
//! Maps strategy names to constructors and wraps every concrete strategy in
//! one tagged union, so callers can pick an algorithm from configuration and
//! still drive it through [`Strategy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::les::{Les, LesParams, LesState};
use crate::algorithms::ma_es::{MaEs, MaEsParams, MaEsState};
use crate::algorithms::open_es::{OpenEs, OpenEsParams, OpenEsState};
use crate::algorithms::sim_anneal::{SimAnneal, SimAnnealParams, SimAnnealState};
use crate::algorithms::simple_ga::{SimpleGa, SimpleGaParams, SimpleGaState};
use crate::error::{EvoResult, EvolutionError};
use crate::fitness::shaping::{FitnessShaper, FitnessShaperConfig};
use crate::learned::lr_modulation::EvoPathMlp;
use crate::population::population::Population;
use crate::random::PrngKey;
use crate::strategy::state::{SearchProgress, StrategyState};
use crate::strategy::traits::Strategy;

/// Registered strategy names
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    SimpleGa,
    SimAnneal,
    OpenEs,
    MaEs,
    Les,
}

impl StrategyKind {
    /// Every registered strategy
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::SimpleGa,
        StrategyKind::SimAnneal,
        StrategyKind::OpenEs,
        StrategyKind::MaEs,
        StrategyKind::Les,
    ];

    /// Registry name, as reported by [`Strategy::name`]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimpleGa => "SimpleGA",
            Self::SimAnneal => "SimAnneal",
            Self::OpenEs => "OpenES",
            Self::MaEs => "MA_ES",
            Self::Les => "LES",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = EvolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| EvolutionError::UnknownStrategy(s.to_string()))
    }
}

/// Any registered strategy
#[derive(Clone, Debug)]
pub enum AnyStrategy {
    SimpleGa(SimpleGa),
    SimAnneal(SimAnneal),
    OpenEs(OpenEs),
    MaEs(MaEs),
    Les(Les),
}

/// State of any registered strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnyState {
    SimpleGa(SimpleGaState),
    SimAnneal(SimAnnealState),
    OpenEs(OpenEsState),
    MaEs(MaEsState),
    Les(LesState),
}

/// Params of any registered strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnyParams {
    SimpleGa(SimpleGaParams),
    SimAnneal(SimAnnealParams),
    OpenEs(OpenEsParams),
    MaEs(MaEsParams),
    Les(LesParams<EvoPathMlp>),
}

macro_rules! each_variant {
    ($value:expr, $ty:ident, $inner:ident => $body:expr) => {
        match $value {
            $ty::SimpleGa($inner) => $body,
            $ty::SimAnneal($inner) => $body,
            $ty::OpenEs($inner) => $body,
            $ty::MaEs($inner) => $body,
            $ty::Les($inner) => $body,
        }
    };
}

impl AnyStrategy {
    /// Construct the registered strategy with default shaping
    pub fn new(kind: StrategyKind, population_size: usize, num_dims: usize) -> EvoResult<Self> {
        Ok(match kind {
            StrategyKind::SimpleGa => Self::SimpleGa(SimpleGa::new(population_size, num_dims)?),
            StrategyKind::SimAnneal => Self::SimAnneal(SimAnneal::new(population_size, num_dims)?),
            StrategyKind::OpenEs => Self::OpenEs(OpenEs::new(population_size, num_dims)?),
            StrategyKind::MaEs => Self::MaEs(MaEs::new(population_size, num_dims)?),
            StrategyKind::Les => Self::Les(Les::new(population_size, num_dims)?),
        })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::SimpleGa(_) => StrategyKind::SimpleGa,
            Self::SimAnneal(_) => StrategyKind::SimAnneal,
            Self::OpenEs(_) => StrategyKind::OpenEs,
            Self::MaEs(_) => StrategyKind::MaEs,
            Self::Les(_) => StrategyKind::Les,
        }
    }

    /// Replace the fitness shaping of the wrapped strategy
    pub fn with_fitness_shaper(self, fitness_shaper: FitnessShaper) -> Self {
        match self {
            Self::SimpleGa(s) => Self::SimpleGa(s.with_fitness_shaper(fitness_shaper)),
            Self::SimAnneal(s) => Self::SimAnneal(s.with_fitness_shaper(fitness_shaper)),
            Self::OpenEs(s) => Self::OpenEs(s.with_fitness_shaper(fitness_shaper)),
            Self::MaEs(s) => Self::MaEs(s.with_fitness_shaper(fitness_shaper)),
            Self::Les(s) => Self::Les(s.with_fitness_shaper(fitness_shaper)),
        }
    }

    fn state_mismatch(&self, state: &AnyState, params: &AnyParams) -> EvolutionError {
        let found = if state.kind() != self.kind() {
            state.kind()
        } else {
            params.kind()
        };
        EvolutionError::StateMismatch {
            expected: self.kind().name(),
            found: found.name(),
        }
    }
}

impl AnyState {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::SimpleGa(_) => StrategyKind::SimpleGa,
            Self::SimAnneal(_) => StrategyKind::SimAnneal,
            Self::OpenEs(_) => StrategyKind::OpenEs,
            Self::MaEs(_) => StrategyKind::MaEs,
            Self::Les(_) => StrategyKind::Les,
        }
    }
}

impl AnyParams {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::SimpleGa(_) => StrategyKind::SimpleGa,
            Self::SimAnneal(_) => StrategyKind::SimAnneal,
            Self::OpenEs(_) => StrategyKind::OpenEs,
            Self::MaEs(_) => StrategyKind::MaEs,
            Self::Les(_) => StrategyKind::Les,
        }
    }
}

impl StrategyState for AnyState {
    fn progress(&self) -> &SearchProgress {
        each_variant!(self, AnyState, s => s.progress())
    }

    fn with_progress(self, progress: SearchProgress) -> Self {
        match self {
            Self::SimpleGa(s) => Self::SimpleGa(s.with_progress(progress)),
            Self::SimAnneal(s) => Self::SimAnneal(s.with_progress(progress)),
            Self::OpenEs(s) => Self::OpenEs(s.with_progress(progress)),
            Self::MaEs(s) => Self::MaEs(s.with_progress(progress)),
            Self::Les(s) => Self::Les(s.with_progress(progress)),
        }
    }
}

impl Strategy for AnyStrategy {
    type State = AnyState;
    type Params = AnyParams;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn population_size(&self) -> usize {
        each_variant!(self, AnyStrategy, s => s.population_size())
    }

    fn num_dims(&self) -> usize {
        each_variant!(self, AnyStrategy, s => s.num_dims())
    }

    fn fitness_shaper(&self) -> &FitnessShaper {
        each_variant!(self, AnyStrategy, s => s.fitness_shaper())
    }

    fn default_params(&self) -> AnyParams {
        match self {
            Self::SimpleGa(s) => AnyParams::SimpleGa(s.default_params()),
            Self::SimAnneal(s) => AnyParams::SimAnneal(s.default_params()),
            Self::OpenEs(s) => AnyParams::OpenEs(s.default_params()),
            Self::MaEs(s) => AnyParams::MaEs(s.default_params()),
            Self::Les(s) => AnyParams::Les(s.default_params()),
        }
    }

    fn init_state(&self, key: PrngKey, params: &AnyParams) -> EvoResult<AnyState> {
        match (self, params) {
            (Self::SimpleGa(s), AnyParams::SimpleGa(p)) => s.init_state(key, p).map(AnyState::SimpleGa),
            (Self::SimAnneal(s), AnyParams::SimAnneal(p)) => {
                s.init_state(key, p).map(AnyState::SimAnneal)
            }
            (Self::OpenEs(s), AnyParams::OpenEs(p)) => s.init_state(key, p).map(AnyState::OpenEs),
            (Self::MaEs(s), AnyParams::MaEs(p)) => s.init_state(key, p).map(AnyState::MaEs),
            (Self::Les(s), AnyParams::Les(p)) => s.init_state(key, p).map(AnyState::Les),
            _ => Err(EvolutionError::StateMismatch {
                expected: self.kind().name(),
                found: params.kind().name(),
            }),
        }
    }

    fn sample(
        &self,
        key: PrngKey,
        state: &AnyState,
        params: &AnyParams,
    ) -> EvoResult<(Population, AnyState)> {
        match (self, state, params) {
            (Self::SimpleGa(s), AnyState::SimpleGa(st), AnyParams::SimpleGa(p)) => {
                let (population, next) = s.sample(key, st, p)?;
                Ok((population, AnyState::SimpleGa(next)))
            }
            (Self::SimAnneal(s), AnyState::SimAnneal(st), AnyParams::SimAnneal(p)) => {
                let (population, next) = s.sample(key, st, p)?;
                Ok((population, AnyState::SimAnneal(next)))
            }
            (Self::OpenEs(s), AnyState::OpenEs(st), AnyParams::OpenEs(p)) => {
                let (population, next) = s.sample(key, st, p)?;
                Ok((population, AnyState::OpenEs(next)))
            }
            (Self::MaEs(s), AnyState::MaEs(st), AnyParams::MaEs(p)) => {
                let (population, next) = s.sample(key, st, p)?;
                Ok((population, AnyState::MaEs(next)))
            }
            (Self::Les(s), AnyState::Les(st), AnyParams::Les(p)) => {
                let (population, next) = s.sample(key, st, p)?;
                Ok((population, AnyState::Les(next)))
            }
            _ => Err(self.state_mismatch(state, params)),
        }
    }

    fn update(
        &self,
        key: PrngKey,
        population: &Population,
        fitness: &[f64],
        state: &AnyState,
        params: &AnyParams,
    ) -> EvoResult<AnyState> {
        match (self, state, params) {
            (Self::SimpleGa(s), AnyState::SimpleGa(st), AnyParams::SimpleGa(p)) => s
                .update(key, population, fitness, st, p)
                .map(AnyState::SimpleGa),
            (Self::SimAnneal(s), AnyState::SimAnneal(st), AnyParams::SimAnneal(p)) => s
                .update(key, population, fitness, st, p)
                .map(AnyState::SimAnneal),
            (Self::OpenEs(s), AnyState::OpenEs(st), AnyParams::OpenEs(p)) => s
                .update(key, population, fitness, st, p)
                .map(AnyState::OpenEs),
            (Self::MaEs(s), AnyState::MaEs(st), AnyParams::MaEs(p)) => s
                .update(key, population, fitness, st, p)
                .map(AnyState::MaEs),
            (Self::Les(s), AnyState::Les(st), AnyParams::Les(p)) => s
                .update(key, population, fitness, st, p)
                .map(AnyState::Les),
            _ => Err(self.state_mismatch(state, params)),
        }
    }
}

/// Serializable strategy selection
///
/// ```json
/// { "strategy": "OpenES", "population_size": 32, "num_dims": 10,
///   "fitness": { "centered_rank": true } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Registry name
    pub strategy: String,
    pub population_size: usize,
    pub num_dims: usize,
    #[serde(default)]
    pub fitness: FitnessShaperConfig,
}

impl StrategyConfig {
    pub fn new(strategy: impl Into<String>, population_size: usize, num_dims: usize) -> Self {
        Self {
            strategy: strategy.into(),
            population_size,
            num_dims,
            fitness: FitnessShaperConfig::default(),
        }
    }

    /// Parse a JSON config record
    pub fn from_json(json: &str) -> EvoResult<Self> {
        serde_json::from_str(json).map_err(|e| EvolutionError::Configuration(e.to_string()))
    }

    /// Resolve the name and build the configured strategy
    pub fn build(&self) -> EvoResult<AnyStrategy> {
        let kind: StrategyKind = self.strategy.parse()?;
        let shaper = self.fitness.build()?;
        let strategy =
            AnyStrategy::new(kind, self.population_size, self.num_dims)?.with_fitness_shaper(shaper);
        debug!(
            strategy = %kind,
            population_size = self.population_size,
            num_dims = self.num_dims,
            "built strategy from config"
        );
        Ok(strategy)
    }
}

pub mod prelude {
    pub use super::{AnyParams, AnyState, AnyStrategy, StrategyConfig, StrategyKind};
}
