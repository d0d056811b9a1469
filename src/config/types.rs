//! Core type definitions for crawl configuration
//!
//! This module contains the `CrawlConfig` struct that holds every knob the
//! orchestrator, the resilience controller and the persistence boundary read.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Growth curve of the delay between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`
    #[default]
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) source_site: String,
    pub(crate) rate_limit_ms: u64,
    pub(crate) max_retries: u32,
    pub(crate) circuit_threshold: u32,
    pub(crate) cooldown_ms: u64,
    pub(crate) max_pages_per_category: u32,
    pub(crate) batch_size: usize,
    pub(crate) parallel_workers: usize,
    pub(crate) operation_timeout_ms: u64,
    /// Bound on session creation and recycling
    pub(crate) launch_timeout_ms: u64,
    pub(crate) retry_base_delay_ms: u64,
    pub(crate) max_backoff_ms: u64,
    pub(crate) backoff: BackoffStrategy,
    pub(crate) backoff_jitter: bool,
    pub(crate) max_consecutive_structural_failures: u32,
    /// Points per one currency unit; `None` keeps point rewards in points
    pub(crate) point_exchange_rate: Option<f64>,
    pub(crate) currency: String,
    pub(crate) compress_backups: bool,
}
