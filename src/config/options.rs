//! JSON options document
//!
//! Operators tune a run through a camelCase JSON file. Every key is
//! optional; absent keys keep the builder defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::BackoffStrategy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CrawlOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages_per_category: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_base_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_backoff_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_jitter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_consecutive_structural_failures: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_exchange_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compress_backups: Option<bool>,
}

impl CrawlOptions {
    /// Parse an options document
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or unknown keys.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse crawl options")
    }

    /// Read and parse an options file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid options file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_options() {
        let opts = CrawlOptions::from_json_str(
            r#"{"rateLimitMs": 500, "maxRetries": 4, "circuitThreshold": 3,
                "cooldownMs": 1000, "maxPagesPerCategory": 5, "batchSize": 10,
                "parallelWorkers": 2, "backoff": "linear", "pointExchangeRate": 10}"#,
        )
        .unwrap();

        assert_eq!(opts.rate_limit_ms, Some(500));
        assert_eq!(opts.max_retries, Some(4));
        assert_eq!(opts.parallel_workers, Some(2));
        assert_eq!(opts.backoff, Some(BackoffStrategy::Linear));
        assert_eq!(opts.point_exchange_rate, Some(10.0));
        assert!(opts.cooldown_ms.is_some());
        assert!(opts.currency.is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(CrawlOptions::from_json_str(r#"{"rateLimit": 5}"#).is_err());
    }

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(CrawlOptions::from_json_str("{}").unwrap(), CrawlOptions::default());
    }
}
