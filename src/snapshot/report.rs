//! Delta report written after each diff
//!
//! The report is the human-facing summary of what changed upstream since
//! the previous baseline. Field names follow the JSON layout downstream
//! dashboards already read.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::types::DiffResult;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaSummary {
    pub total_scanned: usize,
    pub new_campaigns: usize,
    pub updated_campaigns: usize,
    pub deleted_campaigns: usize,
    pub unchanged_campaigns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedEntry {
    pub before: Record,
    pub after: Record,
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Differences {
    pub new: Vec<Record>,
    pub updated: Vec<UpdatedEntry>,
    pub deleted: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaReport {
    pub timestamp: DateTime<Utc>,
    pub summary: DeltaSummary,
    pub differences: Differences,
}

impl DeltaReport {
    /// Build a report; `total_scanned` is the size of the current snapshot
    #[must_use]
    pub fn from_diff(diff: &DiffResult, total_scanned: usize, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            summary: DeltaSummary {
                total_scanned,
                new_campaigns: diff.new.len(),
                updated_campaigns: diff.updated.len(),
                deleted_campaigns: diff.deleted.len(),
                unchanged_campaigns: diff.unchanged_count,
            },
            differences: Differences {
                new: diff.new.clone(),
                updated: diff
                    .updated
                    .iter()
                    .map(|u| UpdatedEntry {
                        before: u.before.clone(),
                        after: u.after.clone(),
                        changes: u.changed_fields.clone(),
                    })
                    .collect(),
                deleted: diff.deleted.clone(),
            },
        }
    }

    /// File name derived from the report timestamp
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("delta-{}.json", self.timestamp.format("%Y%m%dT%H%M%S%.3fZ"))
    }

    /// Write the report into `dir` atomically and return its path
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or the file
    /// cannot be written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report dir {}", dir.display()))?;

        let path = dir.join(self.file_name());
        let json = serde_json::to_vec_pretty(self).context("Failed to serialize delta report")?;

        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(&json)?;
        temp_file
            .persist(&path)
            .with_context(|| format!("Failed to persist delta report {}", path.display()))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Device, RewardValue};
    use crate::snapshot::{Snapshot, diff};
    use tempfile::TempDir;

    fn rec(key: &str, reward: &str) -> Record {
        Record {
            source_site: "s".into(),
            category_id: "c".into(),
            external_id: None,
            canonical_key: key.into(),
            title: key.into(),
            reward_value: RewardValue::unknown(reward),
            url: None,
            device: Device::All,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn json_layout_matches_dashboard_contract() {
        let d = diff(
            &Snapshot::from_records([rec("A", "1"), rec("B", "1")]),
            &Snapshot::from_records([rec("A", "2"), rec("C", "1")]),
        );
        let report = DeltaReport::from_diff(&d, 2, Utc::now());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["summary"]["totalScanned"], 2);
        assert_eq!(value["summary"]["newCampaigns"], 1);
        assert_eq!(value["summary"]["updatedCampaigns"], 1);
        assert_eq!(value["summary"]["deletedCampaigns"], 1);
        assert_eq!(value["summary"]["unchangedCampaigns"], 0);
        assert_eq!(value["differences"]["updated"][0]["changes"][0], "rewardValue");
        assert_eq!(value["differences"]["deleted"][0]["canonicalKey"], "B");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn writes_into_directory() {
        let dir = TempDir::new().unwrap();
        let report = DeltaReport::from_diff(&DiffResult::default(), 0, Utc::now());
        let path = report.write_to_dir(&dir.path().join("reports")).unwrap();

        assert!(path.file_name().unwrap().to_string_lossy().starts_with("delta-"));
        let back: DeltaReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
