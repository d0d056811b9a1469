//! Run-wide record accumulation
//!
//! All worker lanes commit finished categories through one mutex. A commit
//! deduplicates by canonical key, marks the category complete and saves the
//! checkpoint before the lock is released, so the file on disk always
//! matches the in-memory state.

use log::{debug, error};
use std::collections::HashSet;
use tokio::sync::Mutex;

use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointManager};
use crate::record::Record;

/// Counts produced by one category commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub accepted: usize,
    pub duplicates: usize,
}

struct AccumulatorState {
    checkpoint: Checkpoint,
    keys: HashSet<String>,
}

pub struct Accumulator {
    state: Mutex<AccumulatorState>,
}

impl Accumulator {
    /// Start from a checkpoint, reusing its records and seen keys
    #[must_use]
    pub fn new(checkpoint: Checkpoint) -> Self {
        let keys = checkpoint.key_set();
        Self {
            state: Mutex::new(AccumulatorState { checkpoint, keys }),
        }
    }

    /// Commit the records of a category that reached a final state.
    ///
    /// Records whose key was already seen in this run are dropped; the first
    /// occurrence wins. The checkpoint save happens under the lock. A failed
    /// save is returned but the in-memory commit stands.
    pub async fn commit_category(
        &self,
        index: usize,
        records: Vec<Record>,
        unfinished: bool,
        manager: &CheckpointManager,
    ) -> (CommitStats, Result<(), CheckpointError>) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let mut stats = CommitStats::default();

        for record in records {
            if state.keys.insert(record.canonical_key.clone()) {
                state.checkpoint.canonical_keys_seen.push(record.canonical_key.clone());
                state.checkpoint.accumulated_records.push(record);
                stats.accepted += 1;
            } else {
                debug!("Duplicate canonical key {} dropped", record.canonical_key);
                stats.duplicates += 1;
            }
        }

        if !state.checkpoint.completed_category_indices.contains(&index) {
            state.checkpoint.completed_category_indices.push(index);
        }
        if unfinished && !state.checkpoint.failed_category_indices.contains(&index) {
            state.checkpoint.failed_category_indices.push(index);
        }

        let saved = manager.save(&mut state.checkpoint).await;
        if let Err(e) = &saved {
            error!(target: "rewardscrape::checkpoint", "Checkpoint save after category #{index} failed: {e}");
        }
        (stats, saved)
    }

    /// Persist the current state without committing anything new
    ///
    /// # Errors
    ///
    /// Returns the checkpoint manager's error.
    pub async fn save(&self, manager: &CheckpointManager) -> Result<(), CheckpointError> {
        let mut guard = self.state.lock().await;
        manager.save(&mut guard.checkpoint).await
    }

    /// Final state: accumulated records plus the failed category indices
    pub fn into_parts(self) -> (Vec<Record>, Vec<usize>) {
        let state = self.state.into_inner();
        (
            state.checkpoint.accumulated_records,
            state.checkpoint.failed_category_indices,
        )
    }
}
