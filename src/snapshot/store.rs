//! Baseline persistence with atomic writes
//!
//! The baseline is replaced only after a fully successful run. Writes go
//! to a temp file that is synced and renamed over the previous baseline so
//! a crash never leaves a half-written file behind.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::types::Snapshot;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("baseline I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("baseline JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaselineFile {
    saved_at: DateTime<Utc>,
    entries: Snapshot,
}

/// Reads and replaces the baseline snapshot file
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous baseline; `None` on the very first run
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No baseline at {}, starting empty", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(SnapshotError::io(&self.path, e)),
        };

        let file: BaselineFile = serde_json::from_str(&contents)?;
        debug!(
            "Loaded baseline with {} entries saved at {}",
            file.entries.len(),
            file.saved_at
        );
        Ok(Some(file.entries))
    }

    /// Atomically replace the baseline
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or file system failure; the
    /// previous baseline is left intact in that case.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SnapshotError::io(parent, e))?;
        }

        let file = BaselineFile {
            saved_at: Utc::now(),
            entries: snapshot.clone(),
        };
        let json = serde_json::to_vec(&file)?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut handle = fs::File::create(&temp_path)
            .await
            .map_err(|e| SnapshotError::io(&temp_path, e))?;
        handle
            .write_all(&json)
            .await
            .map_err(|e| SnapshotError::io(&temp_path, e))?;
        handle
            .sync_all()
            .await
            .map_err(|e| SnapshotError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| SnapshotError::io(&self.path, e))?;

        info!(
            "Saved baseline with {} entries to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Device, Record, RewardValue};
    use tempfile::TempDir;

    fn rec(key: &str) -> Record {
        Record {
            source_site: "s".into(),
            category_id: "c".into(),
            external_id: Some(key.into()),
            canonical_key: key.into(),
            title: format!("title {key}"),
            reward_value: RewardValue::unknown("?"),
            url: None,
            device: Device::Pc,
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_baseline_is_none() {
        let dir = TempDir::new().unwrap();
        let store = BaselineStore::new(dir.path().join("baseline.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = BaselineStore::new(dir.path().join("nested").join("baseline.json"));
        let snap = Snapshot::from_records([rec("a"), rec("b")]);

        store.save(&snap).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded, snap);
        assert!(!dir.path().join("nested").join("baseline.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_baseline_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            BaselineStore::new(&path).load().await,
            Err(SnapshotError::Json(_))
        ));
    }
}
