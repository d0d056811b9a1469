//! Checkpoint persistence with atomic writes
//!
//! The manager is the only writer of the checkpoint file. Every save goes
//! through write-to-temp, sync, rename so a crash mid-save leaves the
//! previous checkpoint readable.

use chrono::Utc;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::types::Checkpoint;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("checkpoint JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckpointError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckpointManager {
    path: PathBuf,
}

impl CheckpointManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint if one exists
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but is unreadable or malformed.
    pub async fn load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CheckpointError::io(&self.path, e)),
        };
        let checkpoint: Checkpoint = serde_json::from_str(&contents)?;
        info!(
            target: "rewardscrape::checkpoint",
            "Loaded checkpoint: {} categories done, {} records, saved at {}",
            checkpoint.completed_category_indices.len(),
            checkpoint.accumulated_records.len(),
            checkpoint.saved_at
        );
        Ok(Some(checkpoint))
    }

    /// Load a checkpoint usable for the given category list.
    ///
    /// A checkpoint written for a different category list, or one that can
    /// no longer be parsed, is ignored with a warning and the run starts
    /// from scratch. Checkpoints without a fingerprint are accepted.
    pub async fn load_matching(&self, fingerprint: &str) -> Option<Checkpoint> {
        match self.load().await {
            Ok(Some(cp)) => match cp.category_fingerprint.as_deref() {
                Some(stored) if stored != fingerprint => {
                    warn!(
                        target: "rewardscrape::checkpoint",
                        "Discarding checkpoint for a different category list ({stored} != {fingerprint})"
                    );
                    None
                }
                _ => Some(cp),
            },
            Ok(None) => None,
            Err(e) => {
                warn!(
                    target: "rewardscrape::checkpoint",
                    "Ignoring unusable checkpoint at {}: {e}",
                    self.path.display()
                );
                None
            }
        }
    }

    /// Atomically persist the checkpoint, stamping `savedAt`
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or file system failure.
    pub async fn save(&self, checkpoint: &mut Checkpoint) -> Result<(), CheckpointError> {
        checkpoint.saved_at = Utc::now();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CheckpointError::io(parent, e))?;
        }

        let json = serde_json::to_vec(checkpoint)?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| CheckpointError::io(&temp_path, e))?;
        file.write_all(&json)
            .await
            .map_err(|e| CheckpointError::io(&temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| CheckpointError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| CheckpointError::io(&self.path, e))?;

        debug!(
            target: "rewardscrape::checkpoint",
            "Checkpoint saved: {} categories, {} records",
            checkpoint.completed_category_indices.len(),
            checkpoint.accumulated_records.len()
        );
        Ok(())
    }

    /// Remove the checkpoint after a fully successful run
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), CheckpointError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(target: "rewardscrape::checkpoint", "Checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckpointError::io(&self.path, e)),
        }
    }
}
