//! Learned-strategy building blocks
//!
//! Pure tensor functions consumed by learned evolution strategies: a
//! progress-time embedding, multi-timescale evolution paths, attention-based
//! recombination weights, path-conditioned learning-rate modulation and the
//! attention operators of learned genetic algorithms.
//! Network weights are plain values; training them is out of scope.

pub mod attention;
pub mod dense;
pub mod evolution_path;
pub mod lga;
pub mod lr_modulation;
pub mod time_embedding;

pub mod prelude {
    pub use super::attention::AttentionWeights;
    pub use super::dense::Dense;
    pub use super::evolution_path::EvolutionPath;
    pub use super::lga::{
        tanh_age, MultiHeadAttention, MutationAttention, SamplingAttention, SelectionAttention,
    };
    pub use super::lr_modulation::{EvoPathMlp, FixedLearningRates, LearningRatePolicy};
    pub use super::time_embedding::{tanh_timestamp, TimeEmbedding};
}
