//! Snapshot and diff result types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::record::{ContentSignature, Record};

/// One key's state inside a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub signature: ContentSignature,
    pub last_seen_record: Record,
}

impl SnapshotEntry {
    #[must_use]
    pub fn new(record: Record) -> Self {
        Self {
            signature: ContentSignature::of(&record),
            last_seen_record: record,
        }
    }
}

/// canonicalKey → (signature, last seen record)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: HashMap<String, SnapshotEntry>,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records; the first record seen for a key wins
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut snapshot = Self::new();
        for record in records {
            snapshot.insert(record);
        }
        snapshot
    }

    /// Insert unless the key is already present. Returns whether it was inserted.
    pub fn insert(&mut self, record: Record) -> bool {
        match self.entries.entry(record.canonical_key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(SnapshotEntry::new(record));
                true
            }
        }
    }

    /// Insert a prebuilt entry unless its key is already present
    pub fn insert_entry(&mut self, key: String, entry: SnapshotEntry) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SnapshotEntry> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SnapshotEntry)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

/// A record present in both snapshots with a different signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedRecord {
    pub before: Record,
    pub after: Record,
    pub changed_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    pub new: Vec<Record>,
    pub updated: Vec<UpdatedRecord>,
    pub deleted: Vec<Record>,
    pub unchanged_count: usize,
}

impl DiffResult {
    /// |new| + |updated| + |deleted| + unchanged
    #[must_use]
    pub fn total_keys(&self) -> usize {
        self.new.len() + self.updated.len() + self.deleted.len() + self.unchanged_count
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !(self.new.is_empty() && self.updated.is_empty() && self.deleted.is_empty())
    }

    /// Records the persistence gateway should receive: new then updated
    #[must_use]
    pub fn changed_records(&self) -> Vec<Record> {
        self.new
            .iter()
            .cloned()
            .chain(self.updated.iter().map(|u| u.after.clone()))
            .collect()
    }
}
