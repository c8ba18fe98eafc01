//! Checkpoint state structures
//!
//! A checkpoint is a snapshot of one State/Params pair plus the name of
//! the strategy that produced it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::strategy::state::StrategyState;
use crate::strategy::traits::Strategy;

/// Current checkpoint format version
pub const CHECKPOINT_VERSION: u32 = 1;

/// Snapshot of a strategy run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<P, S> {
    /// Schema version for forward compatibility
    pub version: u32,
    /// Registry name of the strategy
    pub strategy: String,
    /// Completed generations at the time of the snapshot
    pub generation: u64,
    pub params: P,
    pub state: S,
    /// Custom metadata
    pub metadata: HashMap<String, String>,
}

impl<P, S: StrategyState> Checkpoint<P, S> {
    /// Create a new checkpoint
    pub fn new(strategy: impl Into<String>, params: P, state: S) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            strategy: strategy.into(),
            generation: state.generation_counter(),
            params,
            state,
            metadata: HashMap::new(),
        }
    }

    /// Snapshot the state and params of `strategy`
    pub fn capture<St>(strategy: &St, params: &P, state: &S) -> Self
    where
        St: Strategy<Params = P, State = S>,
        P: Clone,
    {
        Self::new(strategy.name(), params.clone(), state.clone())
    }
}

impl<P, S> Checkpoint<P, S> {
    /// Add custom metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check if checkpoint is compatible with current version
    pub fn is_compatible(&self) -> bool {
        self.version <= CHECKPOINT_VERSION
    }

    /// Whether this checkpoint was taken from a strategy with `name`
    pub fn is_from(&self, name: &str) -> bool {
        self.strategy == name
    }

    /// Split into params and state
    pub fn into_parts(self) -> (P, S) {
        (self.params, self.state)
    }
}
