//! Baseline versus current comparison

use log::debug;

use super::types::{DiffResult, Snapshot, UpdatedRecord};
use crate::record::Record;

/// Names of the displayed fields that differ between two versions of a record
#[must_use]
pub fn changed_fields(before: &Record, after: &Record) -> Vec<String> {
    let mut fields = Vec::new();
    if before.title != after.title {
        fields.push("title".to_string());
    }
    if before.reward_value != after.reward_value {
        fields.push("rewardValue".to_string());
    }
    if before.device != after.device {
        fields.push("device".to_string());
    }
    if before.url != after.url {
        fields.push("url".to_string());
    }
    if before.category_id != after.category_id {
        fields.push("categoryId".to_string());
    }
    fields
}

/// Classify every key of `baseline ∪ current` as new, updated, deleted or unchanged.
///
/// Runs in O(|baseline| + |current|) and leaves both snapshots untouched.
/// Output lists are ordered by canonical key.
#[must_use]
pub fn diff(baseline: &Snapshot, current: &Snapshot) -> DiffResult {
    let mut result = DiffResult::default();

    for (key, entry) in current.iter() {
        match baseline.get(key) {
            None => result.new.push(entry.last_seen_record.clone()),
            Some(previous) if previous.signature != entry.signature => {
                result.updated.push(UpdatedRecord {
                    changed_fields: changed_fields(&previous.last_seen_record, &entry.last_seen_record),
                    before: previous.last_seen_record.clone(),
                    after: entry.last_seen_record.clone(),
                });
            }
            Some(_) => result.unchanged_count += 1,
        }
    }

    for (key, entry) in baseline.iter() {
        if !current.contains_key(key) {
            result.deleted.push(entry.last_seen_record.clone());
        }
    }

    result.new.sort_by(|a, b| a.canonical_key.cmp(&b.canonical_key));
    result
        .updated
        .sort_by(|a, b| a.after.canonical_key.cmp(&b.after.canonical_key));
    result.deleted.sort_by(|a, b| a.canonical_key.cmp(&b.canonical_key));

    debug!(
        "diff: {} new, {} updated, {} deleted, {} unchanged",
        result.new.len(),
        result.updated.len(),
        result.deleted.len(),
        result.unchanged_count
    );

    result
}
