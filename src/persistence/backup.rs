//! Immutable per-batch backups
//!
//! Each run writes into its own directory and every batch file is created
//! exactly once; an existing file is never overwritten.

use anyhow::{Context, Result};
use chrono::Utc;
use flate2::{Compression, GzBuilder};
use log::debug;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::record::Record;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackupFile<'a> {
    run_id: &'a str,
    batch_index: usize,
    written_at: chrono::DateTime<Utc>,
    records: &'a [Record],
}

#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
    run_id: String,
    compress: bool,
}

impl BackupWriter {
    /// Writer for `<root>/<run_id>/`
    pub fn new(root: impl AsRef<Path>, run_id: &Uuid, compress: bool) -> Self {
        let run_id = run_id.to_string();
        Self {
            dir: root.as_ref().join(&run_id),
            run_id,
            compress,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(&self, batch_index: usize) -> String {
        if self.compress {
            format!("batch-{batch_index:05}.json.gz")
        } else {
            format!("batch-{batch_index:05}.json")
        }
    }

    /// Write one batch and return the backup path
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created, the batch
    /// cannot be serialized, or a file for this batch already exists.
    pub fn write_batch(&self, batch_index: usize, records: &[Record]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create backup dir {}", self.dir.display()))?;

        let json = serde_json::to_vec(&BackupFile {
            run_id: &self.run_id,
            batch_index,
            written_at: Utc::now(),
            records,
        })
        .context("Failed to serialize backup batch")?;

        let name = self.file_name(batch_index);
        let path = self.dir.join(&name);
        let temp_file = NamedTempFile::new_in(&self.dir)?;

        let temp_file = if self.compress {
            let mut gz = GzBuilder::new()
                .filename(name.trim_end_matches(".gz"))
                .write(temp_file, Compression::new(3));
            gz.write_all(&json)?;
            gz.finish()?
        } else {
            let mut temp_file = temp_file;
            temp_file.write_all(&json)?;
            temp_file
        };
        temp_file.as_file().sync_all()?;

        temp_file
            .persist_noclobber(&path)
            .with_context(|| format!("Backup {} already exists or cannot be written", path.display()))?;

        debug!("Backed up {} records to {}", records.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Device, RewardValue};
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn rec(key: &str) -> Record {
        Record {
            source_site: "s".into(),
            category_id: "c".into(),
            external_id: None,
            canonical_key: key.into(),
            title: key.into(),
            reward_value: RewardValue::unknown("1"),
            url: None,
            device: Device::All,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn batches_are_write_once() {
        let dir = TempDir::new().unwrap();
        let writer = BackupWriter::new(dir.path(), &Uuid::new_v4(), false);

        let path = writer.write_batch(0, &[rec("a")]).unwrap();
        let body: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(body["records"][0]["canonicalKey"], "a");
        assert_eq!(body["batchIndex"], 0);

        assert!(writer.write_batch(0, &[rec("b")]).is_err());
        let again: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(again["records"][0]["canonicalKey"], "a");
    }

    #[test]
    fn compressed_batches_decode() {
        let dir = TempDir::new().unwrap();
        let writer = BackupWriter::new(dir.path(), &Uuid::new_v4(), true);
        let path = writer.write_batch(3, &[rec("z")]).unwrap();
        assert!(path.to_string_lossy().ends_with("batch-00003.json.gz"));

        let mut json = String::new();
        GzDecoder::new(std::fs::File::open(&path).unwrap())
            .read_to_string(&mut json)
            .unwrap();
        assert!(json.contains("\"canonicalKey\":\"z\""));
    }
}
