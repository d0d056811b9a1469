//! Persistence gateway boundary
//!
//! Changed records leave the crawl core in bounded batches. Every batch is
//! written to an immutable local backup before the gateway sees it, so the
//! backups can rebuild the catalog if downstream upserts keep failing.

pub mod backup;
pub mod batch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::record::Record;

pub use backup::BackupWriter;
pub use batch::{PersistSummary, persist_in_batches};

/// What the downstream store reports for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub saved_count: usize,
    pub updated_count: usize,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Durable storage for normalized records
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Insert or update a batch keyed by canonical key
    ///
    /// Partial failures belong in `UpsertOutcome::errors`; an `Err` means
    /// the whole batch was not accepted.
    async fn upsert_batch(&self, records: &[Record]) -> anyhow::Result<UpsertOutcome>;
}
