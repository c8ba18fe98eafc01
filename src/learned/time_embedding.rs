//! Progress-time embedding
//!
//! Maps an iteration count to a bounded feature vector so learned update
//! rules can condition on optimization progress.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};

/// Timescales (in generations) from short to long horizons
pub const DEFAULT_TIMESCALES: [f64; 13] = [
    1.0, 3.0, 10.0, 30.0, 50.0, 100.0, 250.0, 500.0, 750.0, 1000.0, 1250.0, 1500.0, 2000.0,
];

/// `tanh(t / timescale - 1)` over a bank of timescales
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeEmbedding {
    timescales: Vec<f64>,
}

impl Default for TimeEmbedding {
    fn default() -> Self {
        Self {
            timescales: DEFAULT_TIMESCALES.to_vec(),
        }
    }
}

impl TimeEmbedding {
    /// Embedding over custom timescales; all must be positive
    pub fn new(timescales: Vec<f64>) -> EvoResult<Self> {
        if timescales.is_empty() || timescales.iter().any(|&s| !(s > 0.0)) {
            return Err(EvolutionError::Configuration(
                "Timescales must be non-empty and positive".to_string(),
            ));
        }
        Ok(Self { timescales })
    }

    /// Length of the embedding
    pub fn dim(&self) -> usize {
        self.timescales.len()
    }

    pub fn timescales(&self) -> &[f64] {
        &self.timescales
    }

    /// Embed an iteration count
    pub fn embed(&self, t: f64) -> DVector<f64> {
        DVector::from_iterator(
            self.timescales.len(),
            self.timescales.iter().map(|s| (t / s - 1.0).tanh()),
        )
    }
}

/// Embed `t` with [`DEFAULT_TIMESCALES`]
pub fn tanh_timestamp(t: f64) -> DVector<f64> {
    TimeEmbedding::default().embed(t)
}
