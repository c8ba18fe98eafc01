//! Gradient optimizers
//!
//! Descent steps used by gradient-estimating strategies. Optimizers are
//! pure: a step takes parameters, a gradient and a state, and returns the
//! new parameters with the new state.

use serde::{Deserialize, Serialize};

/// Gradient-descent update rule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GradientOptimizer {
    /// Stochastic gradient descent with heavy-ball momentum
    Sgd { momentum: f64 },
    /// Adam (Kingma & Ba, 2014)
    Adam { beta1: f64, beta2: f64, eps: f64 },
}

impl Default for GradientOptimizer {
    fn default() -> Self {
        Self::adam()
    }
}

/// Moments and learning rate threaded between optimizer steps
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerState {
    /// Current learning rate
    pub lrate: f64,
    /// First moment (momentum buffer for SGD)
    pub m: Vec<f64>,
    /// Second moment (unused by SGD)
    pub v: Vec<f64>,
    /// Number of steps taken
    pub step: u64,
}

impl GradientOptimizer {
    /// Plain SGD without momentum
    pub fn sgd() -> Self {
        Self::Sgd { momentum: 0.0 }
    }

    /// Adam with its usual defaults
    pub fn adam() -> Self {
        Self::Adam {
            beta1: 0.99,
            beta2: 0.999,
            eps: 1e-8,
        }
    }

    /// Registry name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sgd { .. } => "sgd",
            Self::Adam { .. } => "adam",
        }
    }

    /// Zeroed state for `num_dims` parameters
    pub fn init(&self, num_dims: usize, lrate: f64) -> OptimizerState {
        OptimizerState {
            lrate,
            m: vec![0.0; num_dims],
            v: vec![0.0; num_dims],
            step: 0,
        }
    }

    /// One descent step on `params` along `grad`
    pub fn step(
        &self,
        params: &[f64],
        grad: &[f64],
        state: &OptimizerState,
    ) -> (Vec<f64>, OptimizerState) {
        let t = state.step + 1;
        match *self {
            Self::Sgd { momentum } => {
                let m: Vec<f64> = grad
                    .iter()
                    .zip(&state.m)
                    .map(|(g, m)| g + momentum * m)
                    .collect();
                let params = params
                    .iter()
                    .zip(&m)
                    .map(|(p, m)| p - state.lrate * m)
                    .collect();
                (
                    params,
                    OptimizerState {
                        m,
                        step: t,
                        ..state.clone()
                    },
                )
            }
            Self::Adam { beta1, beta2, eps } => {
                let m: Vec<f64> = grad
                    .iter()
                    .zip(&state.m)
                    .map(|(g, m)| (1.0 - beta1) * g + beta1 * m)
                    .collect();
                let v: Vec<f64> = grad
                    .iter()
                    .zip(&state.v)
                    .map(|(g, v)| (1.0 - beta2) * g * g + beta2 * v)
                    .collect();

                // Bias correction
                let m_scale = 1.0 / (1.0 - beta1.powi(t as i32));
                let v_scale = 1.0 / (1.0 - beta2.powi(t as i32));

                let params = params
                    .iter()
                    .zip(m.iter().zip(&v))
                    .map(|(p, (m, v))| p - state.lrate * m * m_scale / ((v * v_scale).sqrt() + eps))
                    .collect();
                (
                    params,
                    OptimizerState {
                        lrate: state.lrate,
                        m,
                        v,
                        step: t,
                    },
                )
            }
        }
    }
}
