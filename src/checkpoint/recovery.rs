//! Checkpoint recovery and persistence
//!
//! Provides serialization to/from files with versioning.

use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::state::{Checkpoint, CHECKPOINT_VERSION};
use crate::error::CheckpointError;

/// Magic bytes following the version header of binary checkpoints
const BINARY_MAGIC: &[u8; 4] = b"EVST";

/// Format for checkpoint serialization
///
/// JSON cannot represent NaN or infinite values, which fresh states use as
/// sentinels; the binary format is lossless.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CheckpointFormat {
    /// JSON format (human-readable, larger)
    Json,
    /// Binary format (compact, lossless)
    #[default]
    Binary,
}

impl CheckpointFormat {
    fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "ckpt",
        }
    }
}

/// Save a checkpoint to a file
pub fn save_checkpoint<P, S>(
    checkpoint: &Checkpoint<P, S>,
    path: impl AsRef<Path>,
    format: CheckpointFormat,
) -> Result<(), CheckpointError>
where
    P: Serialize,
    S: Serialize,
{
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        CheckpointFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, checkpoint)
                .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        }
        CheckpointFormat::Binary => {
            writer.write_all(&CHECKPOINT_VERSION.to_le_bytes())?;
            writer.write_all(BINARY_MAGIC)?;
            bincode::serialize_into(&mut writer, checkpoint)
                .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        }
    }

    writer.flush()?;
    debug!(
        path = %path.display(),
        strategy = %checkpoint.strategy,
        generation = checkpoint.generation,
        "saved checkpoint"
    );
    Ok(())
}

/// Load a checkpoint from a file, detecting its format
pub fn load_checkpoint<P, S>(path: impl AsRef<Path>) -> Result<Checkpoint<P, S>, CheckpointError>
where
    P: DeserializeOwned,
    S: DeserializeOwned,
{
    let path = path.as_ref();
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;

    let checkpoint: Checkpoint<P, S> = if bytes.len() >= 8 && &bytes[4..8] == BINARY_MAGIC {
        let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if version > CHECKPOINT_VERSION {
            return Err(CheckpointError::VersionTooNew(version));
        }
        let checkpoint: Checkpoint<P, S> = bincode::deserialize(&bytes[8..])
            .map_err(|e| CheckpointError::Deserialization(e.to_string()))?;
        if checkpoint.version != version {
            return Err(CheckpointError::Corrupted(format!(
                "header version {version} does not match body version {}",
                checkpoint.version
            )));
        }
        checkpoint
    } else {
        serde_json::from_slice(&bytes)
            .map_err(|e| CheckpointError::Deserialization(e.to_string()))?
    };

    if !checkpoint.is_compatible() {
        return Err(CheckpointError::VersionTooNew(checkpoint.version));
    }
    Ok(checkpoint)
}

/// Periodic checkpointing with rotation
pub struct CheckpointManager {
    /// Directory for checkpoint files
    pub directory: PathBuf,
    /// Base filename for checkpoints
    pub base_name: String,
    /// Serialization format
    pub format: CheckpointFormat,
    /// How many checkpoints to keep
    pub keep_n: usize,
    /// Save interval (generations)
    pub interval: u64,
    current_index: usize,
}

impl CheckpointManager {
    /// Create a new checkpoint manager
    pub fn new(directory: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_name: base_name.into(),
            format: CheckpointFormat::Binary,
            keep_n: 3,
            interval: 100,
            current_index: 0,
        }
    }

    /// Set the serialization format
    pub fn with_format(mut self, format: CheckpointFormat) -> Self {
        self.format = format;
        self
    }

    /// Set how many checkpoints to keep
    pub fn keep(mut self, n: usize) -> Self {
        self.keep_n = n.max(1);
        self
    }

    /// Set the save interval
    pub fn every(mut self, generations: u64) -> Self {
        self.interval = generations.max(1);
        self
    }

    /// Check if a checkpoint should be saved at this generation
    pub fn should_save(&self, generation: u64) -> bool {
        generation > 0 && generation % self.interval == 0
    }

    fn path_for(&self, index: usize) -> PathBuf {
        self.directory.join(format!(
            "{}_{:04}.{}",
            self.base_name,
            index,
            self.format.extension()
        ))
    }

    /// Save a checkpoint and rotate old ones
    pub fn save<P, S>(&mut self, checkpoint: &Checkpoint<P, S>) -> Result<PathBuf, CheckpointError>
    where
        P: Serialize,
        S: Serialize,
    {
        std::fs::create_dir_all(&self.directory)?;

        let path = self.path_for(self.current_index);
        save_checkpoint(checkpoint, &path, self.format)?;

        self.current_index += 1;
        if self.current_index > self.keep_n {
            let old_path = self.path_for(self.current_index - self.keep_n - 1);
            if let Err(e) = std::fs::remove_file(&old_path) {
                debug!(path = %old_path.display(), error = %e, "could not remove old checkpoint");
            }
        }

        Ok(path)
    }

    /// Load the most recent checkpoint in the directory, if any
    pub fn load_latest<P, S>(&self) -> Result<Option<Checkpoint<P, S>>, CheckpointError>
    where
        P: DeserializeOwned,
        S: DeserializeOwned,
    {
        if !self.directory.exists() {
            return Ok(None);
        }
        let prefix = format!("{}_", self.base_name);
        let extension = self.format.extension();

        let latest = std::fs::read_dir(&self.directory)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == extension))
            .filter_map(|p| {
                let stem = p.file_stem()?.to_str()?;
                let index: usize = stem.strip_prefix(&prefix)?.parse().ok()?;
                Some((index, p))
            })
            .max_by_key(|(index, _)| *index);

        match latest {
            Some((_, path)) => load_checkpoint(path).map(Some),
            None => Ok(None),
        }
    }
}
