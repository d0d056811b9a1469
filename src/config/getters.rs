//! Getter methods for `CrawlConfig`
//!
//! Accessors for configuration values plus the file locations derived from
//! the storage directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{BackoffStrategy, CrawlConfig};
use crate::utils::constants::{
    BACKUP_DIRNAME, BASELINE_FILENAME, CHECKPOINT_FILENAME, REPORT_DIRNAME,
};

impl CrawlConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    #[must_use]
    pub fn source_site(&self) -> &str {
        &self.source_site
    }

    #[must_use]
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub fn circuit_threshold(&self) -> u32 {
        self.circuit_threshold
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    #[must_use]
    pub fn max_pages_per_category(&self) -> u32 {
        self.max_pages_per_category
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn parallel_workers(&self) -> usize {
        self.parallel_workers
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    #[must_use]
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_millis(self.launch_timeout_ms)
    }

    #[must_use]
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    #[must_use]
    pub fn backoff(&self) -> BackoffStrategy {
        self.backoff
    }

    #[must_use]
    pub fn backoff_jitter(&self) -> bool {
        self.backoff_jitter
    }

    #[must_use]
    pub fn max_consecutive_structural_failures(&self) -> u32 {
        self.max_consecutive_structural_failures
    }

    #[must_use]
    pub fn point_exchange_rate(&self) -> Option<f64> {
        self.point_exchange_rate
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[must_use]
    pub fn compress_backups(&self) -> bool {
        self.compress_backups
    }

    /// `<storage>/checkpoint.json`
    #[must_use]
    pub fn checkpoint_path(&self) -> PathBuf {
        self.storage_dir.join(CHECKPOINT_FILENAME)
    }

    /// `<storage>/baseline.json`
    #[must_use]
    pub fn baseline_path(&self) -> PathBuf {
        self.storage_dir.join(BASELINE_FILENAME)
    }

    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.storage_dir.join(BACKUP_DIRNAME)
    }

    #[must_use]
    pub fn report_dir(&self) -> PathBuf {
        self.storage_dir.join(REPORT_DIRNAME)
    }
}
