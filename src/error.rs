//! Error types for evostrat
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Error type for checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// IO error during checkpoint
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Checkpoint version is too new
    #[error("Checkpoint version {0} is newer than supported")]
    VersionTooNew(u32),

    /// Corrupted checkpoint data
    #[error("Corrupted checkpoint: {0}")]
    Corrupted(String),
}

/// Top-level error type for strategy operations
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Invalid configuration, reported at construction time
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A solution or vector had the wrong number of dimensions
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A population did not have the strategy's population size
    #[error("Population size mismatch: expected {expected}, got {actual}")]
    PopulationSizeMismatch { expected: usize, actual: usize },

    /// Fitness batch is not index-aligned with the population
    #[error("Fitness length mismatch: expected {expected}, got {actual}")]
    FitnessLengthMismatch { expected: usize, actual: usize },

    /// Empty population
    #[error("Empty population")]
    EmptyPopulation,

    /// State or params belong to a different strategy
    #[error("State mismatch: expected {expected}, found {found}")]
    StateMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// No strategy is registered under this name
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Checkpoint error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Result type alias for strategy operations
pub type EvoResult<T> = Result<T, EvolutionError>;

/// Check that a vector has the expected number of dimensions
pub(crate) fn ensure_dims(expected: usize, actual: usize) -> EvoResult<()> {
    if expected != actual {
        return Err(EvolutionError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evolution_error_display() {
        let err = EvolutionError::DimensionMismatch {
            expected: 10,
            actual: 5,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 10, got 5");

        let err = EvolutionError::Configuration("only one fitness transform".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: only one fitness transform"
        );

        let err = EvolutionError::StateMismatch {
            expected: "SimpleGA",
            found: "SimAnneal",
        };
        assert_eq!(
            err.to_string(),
            "State mismatch: expected SimpleGA, found SimAnneal"
        );
    }

    #[test]
    fn test_evolution_error_from_checkpoint_error() {
        let ckpt_err = CheckpointError::Corrupted("header version 0 does not match body version 1".to_string());
        let evo_err: EvolutionError = ckpt_err.into();
        assert!(matches!(evo_err, EvolutionError::Checkpoint(_)));
    }

    #[test]
    fn test_ensure_dims() {
        assert!(ensure_dims(3, 3).is_ok());
        assert!(matches!(
            ensure_dims(3, 2),
            Err(EvolutionError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
