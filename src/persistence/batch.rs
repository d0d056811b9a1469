//! Batched hand-off to the persistence gateway

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{BackupWriter, PersistenceGateway};
use crate::record::Record;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistSummary {
    pub batches: usize,
    pub saved_count: usize,
    pub updated_count: usize,
    pub errors: Vec<String>,
    pub backup_files: Vec<PathBuf>,
}

impl PersistSummary {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Send `records` to the gateway in chunks of at most `batch_size`.
///
/// Each chunk is backed up first when a writer is given. A failed backup
/// or a failed upsert is recorded and the remaining batches still go out.
pub async fn persist_in_batches<G>(
    gateway: &G,
    records: &[Record],
    batch_size: usize,
    backup: Option<&BackupWriter>,
) -> PersistSummary
where
    G: PersistenceGateway + ?Sized,
{
    let mut summary = PersistSummary::default();

    for (index, batch) in records.chunks(batch_size.max(1)).enumerate() {
        summary.batches += 1;

        if let Some(writer) = backup {
            match writer.write_batch(index, batch) {
                Ok(path) => summary.backup_files.push(path),
                Err(e) => {
                    error!("Backup of batch {index} failed: {e:#}");
                    summary.errors.push(format!("backup batch {index}: {e:#}"));
                }
            }
        }

        match gateway.upsert_batch(batch).await {
            Ok(outcome) => {
                summary.saved_count += outcome.saved_count;
                summary.updated_count += outcome.updated_count;
                if !outcome.errors.is_empty() {
                    warn!(
                        "Batch {index}: {} record errors reported by gateway",
                        outcome.errors.len()
                    );
                    summary
                        .errors
                        .extend(outcome.errors.into_iter().map(|e| format!("batch {index}: {e}")));
                }
            }
            Err(e) => {
                error!("Upsert of batch {index} ({} records) failed: {e:#}", batch.len());
                summary.errors.push(format!("upsert batch {index}: {e:#}"));
            }
        }
    }

    info!(
        "Persisted {} records in {} batches: {} saved, {} updated, {} errors",
        records.len(),
        summary.batches,
        summary.saved_count,
        summary.updated_count,
        summary.errors.len()
    );
    summary
}
