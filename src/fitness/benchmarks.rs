//! Benchmark problems
//!
//! Standard minimization benchmarks for exercising strategies. Each
//! objective is a plain function over a slice; the structs wrap it as a
//! [`Problem`] of fixed dimensionality.

use std::f64::consts::{E, PI};

use crate::fitness::traits::Problem;

/// Metadata shared by benchmark problems
pub trait BenchmarkFunction: Problem {
    fn name(&self) -> &'static str;

    /// Conventional search box, usable as `init_min`/`init_max`
    fn bounds(&self) -> (f64, f64);

    /// Global minimizer
    fn optimal_solution(&self) -> Vec<f64>;

    /// Objective value at the global minimizer
    fn optimal_fitness(&self) -> f64 {
        0.0
    }
}

/// `Σ xᵢ²`
pub fn sphere(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum()
}

/// `10n + Σ (xᵢ² - 10 cos(2π xᵢ))`
pub fn rastrigin(x: &[f64]) -> f64 {
    x.iter()
        .map(|v| v * v - 10.0 * (2.0 * PI * v).cos() + 10.0)
        .sum()
}

/// `Σ 100 (xᵢ₊₁ - xᵢ²)² + (1 - xᵢ)²`
pub fn rosenbrock(x: &[f64]) -> f64 {
    x.windows(2)
        .map(|w| {
            let valley = w[1] - w[0] * w[0];
            100.0 * valley * valley + (1.0 - w[0]) * (1.0 - w[0])
        })
        .sum()
}

/// Ackley with `a = 20`, `b = 0.2`, `c = 2π`
pub fn ackley(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f64;
    let rms = (sphere(x) / n).sqrt();
    let mean_cos = x.iter().map(|v| (2.0 * PI * v).cos()).sum::<f64>() / n;
    20.0 - 20.0 * (-0.2 * rms).exp() + E - mean_cos.exp()
}

macro_rules! benchmark {
    ($(#[$doc:meta])* $name:ident, $objective:path, $bounds:expr, $optimum:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            num_dims: usize,
        }

        impl $name {
            pub fn new(num_dims: usize) -> Self {
                Self { num_dims }
            }
        }

        impl Problem for $name {
            fn num_dims(&self) -> usize {
                self.num_dims
            }

            fn evaluate(&self, solution: &[f64]) -> f64 {
                $objective(solution)
            }
        }

        impl BenchmarkFunction for $name {
            fn name(&self) -> &'static str {
                stringify!($name)
            }

            fn bounds(&self) -> (f64, f64) {
                $bounds
            }

            fn optimal_solution(&self) -> Vec<f64> {
                vec![$optimum; self.num_dims]
            }
        }
    };
}

benchmark!(
    /// Convex, separable bowl with its minimum at the origin
    Sphere, sphere, (-5.12, 5.12), 0.0
);

benchmark!(
    /// Highly multimodal grid of local minima around the origin
    Rastrigin, rastrigin, (-5.12, 5.12), 0.0
);

benchmark!(
    /// Curved valley with its minimum at `(1, ..., 1)`
    Rosenbrock, rosenbrock, (-5.0, 10.0), 1.0
);

benchmark!(
    /// Nearly flat outer region with a deep funnel at the origin
    Ackley, ackley, (-32.768, 32.768), 0.0
);
