//! On-disk checkpoint shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::record::Record;

/// Durable crawl progress.
///
/// `completed_category_indices` holds every category that reached a final
/// state, successful or not; `failed_category_indices` is the subset that
/// failed or stopped on structural drift. Accumulated records are already deduplicated by canonical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub completed_category_indices: Vec<usize>,
    pub accumulated_records: Vec<Record>,
    pub canonical_keys_seen: Vec<String>,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub failed_category_indices: Vec<usize>,
    /// Fingerprint of the category list the indices refer to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_fingerprint: Option<String>,
}

impl Checkpoint {
    #[must_use]
    pub fn empty(category_fingerprint: Option<String>) -> Self {
        Self {
            completed_category_indices: Vec::new(),
            accumulated_records: Vec::new(),
            canonical_keys_seen: Vec::new(),
            saved_at: Utc::now(),
            failed_category_indices: Vec::new(),
            category_fingerprint,
        }
    }

    #[must_use]
    pub fn is_completed(&self, index: usize) -> bool {
        self.completed_category_indices.contains(&index)
    }

    /// Keys seen, including those of accumulated records
    #[must_use]
    pub fn key_set(&self) -> HashSet<String> {
        self.canonical_keys_seen
            .iter()
            .cloned()
            .chain(self.accumulated_records.iter().map(|r| r.canonical_key.clone()))
            .collect()
    }
}
