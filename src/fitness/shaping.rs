//! Fitness shaping
//!
//! Transforms a raw fitness batch into the signal consumed by a strategy
//! update. The order of operations is fixed:
//!
//! 1. negate when maximizing
//! 2. add `w_decay * mean(x²)` per member
//! 3. apply at most one of centered rank, z-score or range normalization

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::population::population::Population;
use crate::population::reduce::{nan_max, nan_mean, nan_min, nan_std, ranks};

/// Added to denominators in z-score and range normalization
pub const SHAPING_EPS: f64 = 1e-10;

/// Fitness values are clamped to `±FITNESS_CLIP` before range transforms
pub const FITNESS_CLIP: f64 = 1e10;

/// The single rank/score transform applied after weight decay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessTransform {
    /// Leave fitness untouched
    #[default]
    Raw,
    /// Ranks scaled to `[-0.5, 0.5]`
    CenteredRank,
    /// Subtract mean, divide by standard deviation
    ZScore,
    /// Affine map into `[-1, 1]`
    NormRange,
}

impl FitnessTransform {
    /// Resolve the mutually exclusive boolean flags into one transform
    ///
    /// Enabling more than one flag is a configuration error.
    pub fn from_flags(centered_rank: bool, z_score: bool, norm_range: bool) -> EvoResult<Self> {
        match (centered_rank, z_score, norm_range) {
            (false, false, false) => Ok(Self::Raw),
            (true, false, false) => Ok(Self::CenteredRank),
            (false, true, false) => Ok(Self::ZScore),
            (false, false, true) => Ok(Self::NormRange),
            _ => Err(EvolutionError::Configuration(
                "Only use one fitness shaping transformation".to_string(),
            )),
        }
    }

    /// Selector name of this transform
    pub fn name(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::CenteredRank => "centered_rank",
            Self::ZScore => "z_score",
            Self::NormRange => "norm_range",
        }
    }

    /// Apply the transform to a fitness batch
    pub fn apply(&self, fitness: &[f64]) -> Vec<f64> {
        match self {
            Self::Raw => fitness.to_vec(),
            Self::CenteredRank => centered_rank(fitness),
            Self::ZScore => z_score(fitness),
            Self::NormRange => range_norm(fitness, -1.0, 1.0),
        }
    }
}

impl fmt::Display for FitnessTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FitnessTransform {
    type Err = EvolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Self::Raw),
            "centered_rank" => Ok(Self::CenteredRank),
            "z_score" => Ok(Self::ZScore),
            "norm_range" => Ok(Self::NormRange),
            other => Err(EvolutionError::Configuration(format!(
                "Unknown fitness transform: {}",
                other
            ))),
        }
    }
}

/// Validated fitness shaping pipeline
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessShaper {
    transform: FitnessTransform,
    w_decay: f64,
    maximize: bool,
}

impl FitnessShaper {
    /// Create a shaper, validating the weight decay
    pub fn new(transform: FitnessTransform, w_decay: f64, maximize: bool) -> EvoResult<Self> {
        if !(w_decay >= 0.0 && w_decay.is_finite()) {
            return Err(EvolutionError::Configuration(format!(
                "Weight decay must be a finite value >= 0, got {}",
                w_decay
            )));
        }
        Ok(Self {
            transform,
            w_decay,
            maximize,
        })
    }

    /// A shaper that passes fitness through unchanged
    pub fn raw() -> Self {
        Self::default()
    }

    /// A shaper with only the given transform enabled
    pub fn with_transform(transform: FitnessTransform) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }

    /// Build from the individual boolean flags
    pub fn from_flags(
        centered_rank: bool,
        z_score: bool,
        norm_range: bool,
        w_decay: f64,
        maximize: bool,
    ) -> EvoResult<Self> {
        let transform = FitnessTransform::from_flags(centered_rank, z_score, norm_range)?;
        Self::new(transform, w_decay, maximize)
    }

    /// The enabled transform
    pub fn transform(&self) -> FitnessTransform {
        self.transform
    }

    /// Weight decay coefficient
    pub fn w_decay(&self) -> f64 {
        self.w_decay
    }

    /// Whether raw fitness is negated before shaping
    pub fn maximize(&self) -> bool {
        self.maximize
    }

    /// Orient raw fitness for minimization (negate when maximizing)
    pub fn orient(&self, fitness: &[f64]) -> Vec<f64> {
        if self.maximize {
            fitness.iter().map(|f| -f).collect()
        } else {
            fitness.to_vec()
        }
    }

    /// Shape a fitness batch for the given population
    pub fn apply(&self, population: &Population, fitness: &[f64]) -> EvoResult<Vec<f64>> {
        if population.len() != fitness.len() {
            return Err(EvolutionError::FitnessLengthMismatch {
                expected: population.len(),
                actual: fitness.len(),
            });
        }

        let mut shaped = self.orient(fitness);

        if self.w_decay > 0.0 {
            for (f, l2) in shaped.iter_mut().zip(population.mean_squares()) {
                *f += self.w_decay * l2;
            }
        }

        Ok(self.transform.apply(&shaped))
    }
}

/// Serializable shaping options
///
/// `fitness_trafo`, when set to a known selector, overrides the three
/// boolean flags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessShaperConfig {
    pub centered_rank: bool,
    pub z_score: bool,
    pub norm_range: bool,
    pub w_decay: f64,
    pub maximize: bool,
    pub fitness_trafo: Option<String>,
}

impl FitnessShaperConfig {
    /// Validate and build the shaper
    pub fn build(&self) -> EvoResult<FitnessShaper> {
        let transform = match self.fitness_trafo.as_deref() {
            Some(name) => name.parse()?,
            None => FitnessTransform::from_flags(self.centered_rank, self.z_score, self.norm_range)?,
        };
        FitnessShaper::new(transform, self.w_decay, self.maximize)
    }
}

/// Ranks scaled to `[-0.5, 0.5]`: the lowest fitness maps to -0.5
///
/// Ties are ranked in index order. A single member maps to 0.
pub fn centered_rank(fitness: &[f64]) -> Vec<f64> {
    if fitness.len() < 2 {
        return vec![0.0; fitness.len()];
    }
    let denom = (fitness.len() - 1) as f64;
    ranks(fitness)
        .into_iter()
        .map(|r| r as f64 / denom - 0.5)
        .collect()
}

/// Standardize to zero mean and unit deviation, ignoring NaNs
pub fn z_score(fitness: &[f64]) -> Vec<f64> {
    let mean = nan_mean(fitness);
    let std = nan_std(fitness);
    fitness
        .iter()
        .map(|f| (f - mean) / (std + SHAPING_EPS))
        .collect()
}

/// Affine map into `[min_val, max_val]` using the batch range
pub fn range_norm(fitness: &[f64], min_val: f64, max_val: f64) -> Vec<f64> {
    let clipped: Vec<f64> = fitness
        .iter()
        .map(|f| f.clamp(-FITNESS_CLIP, FITNESS_CLIP))
        .collect();
    let lo = nan_min(&clipped);
    let hi = nan_max(&clipped);
    clipped
        .iter()
        .map(|f| (max_val - min_val) * (f - lo) / (hi - lo + SHAPING_EPS) + min_val)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pop(n: usize) -> Population {
        Population::filled(n, 2, 0.0)
    }

    #[test]
    fn test_exclusive_flags_rejected() {
        assert!(FitnessShaper::from_flags(true, true, false, 0.0, false).is_err());
        assert!(FitnessShaper::from_flags(true, false, true, 0.0, false).is_err());
        assert!(FitnessShaper::from_flags(false, true, true, 0.0, false).is_err());
        assert!(FitnessShaper::from_flags(false, true, false, 0.0, false).is_ok());
    }

    #[test]
    fn test_negative_weight_decay_rejected() {
        assert!(FitnessShaper::new(FitnessTransform::Raw, -0.1, false).is_err());
        assert!(FitnessShaper::new(FitnessTransform::Raw, f64::NAN, false).is_err());
    }

    #[test]
    fn test_selector_overrides_flags() {
        let config = FitnessShaperConfig {
            centered_rank: true,
            z_score: true,
            fitness_trafo: Some("norm_range".to_string()),
            ..Default::default()
        };
        let shaper = config.build().unwrap();
        assert_eq!(shaper.transform(), FitnessTransform::NormRange);

        let bad = FitnessShaperConfig {
            fitness_trafo: Some("softmax".to_string()),
            ..Default::default()
        };
        assert!(bad.build().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config: FitnessShaperConfig =
            serde_json::from_str(r#"{"centered_rank": true, "w_decay": 0.01}"#).unwrap();
        let shaper = config.build().unwrap();
        assert_eq!(shaper.transform(), FitnessTransform::CenteredRank);
        assert_relative_eq!(shaper.w_decay(), 0.01);
        assert!(!shaper.maximize());
    }

    #[test]
    fn test_centered_rank_endpoints() {
        let cr = centered_rank(&[3.0, -1.0, 10.0, 0.0, 5.0]);
        assert_eq!(cr, vec![0.0, -0.5, 0.5, -0.25, 0.25]);
        assert_eq!(centered_rank(&[7.0]), vec![0.0]);
    }

    #[test]
    fn test_z_score_moments() {
        let z = z_score(&[1.0, 2.0, 3.0, 4.0, 10.0]);
        let mean = z.iter().sum::<f64>() / z.len() as f64;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-9);
        assert_relative_eq!(nan_std(&z), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_range_norm_bounds_and_inf() {
        let r = range_norm(&[0.0, 5.0, 10.0], -1.0, 1.0);
        assert_relative_eq!(r[0], -1.0, epsilon = 1e-9);
        assert_relative_eq!(r[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(r[2], 1.0, epsilon = 1e-9);

        let r = range_norm(&[f64::INFINITY, 0.0], 0.0, 1.0);
        assert!(r.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_apply_maximize_then_rank() {
        let shaper = FitnessShaper::new(FitnessTransform::CenteredRank, 0.0, true).unwrap();
        let shaped = shaper.apply(&pop(3), &[1.0, 3.0, 2.0]).unwrap();
        // Highest raw fitness becomes the best (lowest) rank
        assert_eq!(shaped, vec![0.5, -0.5, 0.0]);
    }

    #[test]
    fn test_apply_weight_decay() {
        let shaper = FitnessShaper::new(FitnessTransform::Raw, 0.5, false).unwrap();
        let population = Population::from_members(vec![vec![2.0, 0.0], vec![0.0, 0.0]]).unwrap();
        let shaped = shaper.apply(&population, &[1.0, 1.0]).unwrap();
        assert_eq!(shaped, vec![2.0, 1.0]);
    }

    #[test]
    fn test_apply_length_mismatch() {
        let shaper = FitnessShaper::raw();
        assert!(matches!(
            shaper.apply(&pop(3), &[1.0, 2.0]),
            Err(EvolutionError::FitnessLengthMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
