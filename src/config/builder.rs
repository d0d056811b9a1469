//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! The storage directory and the source site must be set, in that order,
//! before `build()` becomes available. Everything else has a default.

use anyhow::{Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::options::CrawlOptions;
use super::types::{BackoffStrategy, CrawlConfig};
use crate::utils::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CIRCUIT_THRESHOLD, DEFAULT_COOLDOWN_MS, DEFAULT_CURRENCY,
    DEFAULT_LAUNCH_TIMEOUT_MS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_MAX_CONSECUTIVE_STRUCTURAL_FAILURES,
    DEFAULT_MAX_PAGES_PER_CATEGORY, DEFAULT_MAX_RETRIES, DEFAULT_OPERATION_TIMEOUT_MS,
    DEFAULT_PARALLEL_WORKERS, DEFAULT_RATE_LIMIT_MS, DEFAULT_RETRY_BASE_DELAY_MS,
};

// Type states for the builder
pub struct WithStorageDir;
pub struct Complete;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) storage_dir: Option<PathBuf>,
    pub(crate) source_site: Option<String>,
    pub(crate) rate_limit_ms: u64,
    pub(crate) max_retries: u32,
    pub(crate) circuit_threshold: u32,
    pub(crate) cooldown_ms: u64,
    pub(crate) max_pages_per_category: u32,
    pub(crate) batch_size: usize,
    pub(crate) parallel_workers: usize,
    pub(crate) operation_timeout_ms: u64,
    pub(crate) launch_timeout_ms: u64,
    pub(crate) retry_base_delay_ms: u64,
    pub(crate) max_backoff_ms: u64,
    pub(crate) backoff: BackoffStrategy,
    pub(crate) backoff_jitter: bool,
    pub(crate) max_consecutive_structural_failures: u32,
    pub(crate) point_exchange_rate: Option<f64>,
    pub(crate) currency: String,
    pub(crate) compress_backups: bool,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            source_site: None,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            circuit_threshold: DEFAULT_CIRCUIT_THRESHOLD,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            max_pages_per_category: DEFAULT_MAX_PAGES_PER_CATEGORY,
            batch_size: DEFAULT_BATCH_SIZE,
            parallel_workers: DEFAULT_PARALLEL_WORKERS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            launch_timeout_ms: DEFAULT_LAUNCH_TIMEOUT_MS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            backoff: BackoffStrategy::default(),
            backoff_jitter: true,
            max_consecutive_structural_failures: DEFAULT_MAX_CONSECUTIVE_STRUCTURAL_FAILURES,
            point_exchange_rate: None,
            currency: DEFAULT_CURRENCY.to_string(),
            compress_backups: false,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

impl<State> CrawlConfigBuilder<State> {
    fn into_state<Next>(self) -> CrawlConfigBuilder<Next> {
        CrawlConfigBuilder {
            storage_dir: self.storage_dir,
            source_site: self.source_site,
            rate_limit_ms: self.rate_limit_ms,
            max_retries: self.max_retries,
            circuit_threshold: self.circuit_threshold,
            cooldown_ms: self.cooldown_ms,
            max_pages_per_category: self.max_pages_per_category,
            batch_size: self.batch_size,
            parallel_workers: self.parallel_workers,
            operation_timeout_ms: self.operation_timeout_ms,
            launch_timeout_ms: self.launch_timeout_ms,
            retry_base_delay_ms: self.retry_base_delay_ms,
            max_backoff_ms: self.max_backoff_ms,
            backoff: self.backoff,
            backoff_jitter: self.backoff_jitter,
            max_consecutive_structural_failures: self.max_consecutive_structural_failures,
            point_exchange_rate: self.point_exchange_rate,
            currency: self.currency,
            compress_backups: self.compress_backups,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    /// Total attempts per operation, first try included
    #[must_use]
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = attempts;
        self
    }

    #[must_use]
    pub fn circuit_threshold(mut self, threshold: u32) -> Self {
        self.circuit_threshold = threshold;
        self
    }

    #[must_use]
    pub fn cooldown_ms(mut self, ms: u64) -> Self {
        self.cooldown_ms = ms;
        self
    }

    #[must_use]
    pub fn max_pages_per_category(mut self, pages: u32) -> Self {
        self.max_pages_per_category = pages;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    #[must_use]
    pub fn parallel_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = workers;
        self
    }

    #[must_use]
    pub fn operation_timeout_ms(mut self, ms: u64) -> Self {
        self.operation_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn launch_timeout_ms(mut self, ms: u64) -> Self {
        self.launch_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.retry_base_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn max_backoff_ms(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    #[must_use]
    pub fn backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    #[must_use]
    pub fn backoff_jitter(mut self, enabled: bool) -> Self {
        self.backoff_jitter = enabled;
        self
    }

    #[must_use]
    pub fn max_consecutive_structural_failures(mut self, pages: u32) -> Self {
        self.max_consecutive_structural_failures = pages;
        self
    }

    /// Points per one currency unit, e.g. `10.0` when 10pt = 1 yen
    #[must_use]
    pub fn point_exchange_rate(mut self, rate: f64) -> Self {
        self.point_exchange_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn currency(mut self, label: impl Into<String>) -> Self {
        self.currency = label.into();
        self
    }

    #[must_use]
    pub fn compress_backups(mut self, enabled: bool) -> Self {
        self.compress_backups = enabled;
        self
    }

    /// Overlay every option present in a parsed options document
    #[must_use]
    pub fn options(mut self, opts: &CrawlOptions) -> Self {
        if let Some(v) = opts.rate_limit_ms {
            self.rate_limit_ms = v;
        }
        if let Some(v) = opts.max_retries {
            self.max_retries = v;
        }
        if let Some(v) = opts.circuit_threshold {
            self.circuit_threshold = v;
        }
        if let Some(v) = opts.cooldown_ms {
            self.cooldown_ms = v;
        }
        if let Some(v) = opts.max_pages_per_category {
            self.max_pages_per_category = v;
        }
        if let Some(v) = opts.batch_size {
            self.batch_size = v;
        }
        if let Some(v) = opts.parallel_workers {
            self.parallel_workers = v;
        }
        if let Some(v) = opts.operation_timeout_ms {
            self.operation_timeout_ms = v;
        }
        if let Some(v) = opts.launch_timeout_ms {
            self.launch_timeout_ms = v;
        }
        if let Some(v) = opts.retry_base_delay_ms {
            self.retry_base_delay_ms = v;
        }
        if let Some(v) = opts.max_backoff_ms {
            self.max_backoff_ms = v;
        }
        if let Some(v) = opts.backoff {
            self.backoff = v;
        }
        if let Some(v) = opts.backoff_jitter {
            self.backoff_jitter = v;
        }
        if let Some(v) = opts.max_consecutive_structural_failures {
            self.max_consecutive_structural_failures = v;
        }
        if let Some(v) = opts.point_exchange_rate {
            self.point_exchange_rate = Some(v);
        }
        if let Some(v) = &opts.currency {
            self.currency.clone_from(v);
        }
        if let Some(v) = opts.compress_backups {
            self.compress_backups = v;
        }
        self
    }
}

impl CrawlConfigBuilder<()> {
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithStorageDir> {
        self.storage_dir = Some(dir.into());
        self.into_state()
    }
}

impl CrawlConfigBuilder<WithStorageDir> {
    /// Identifier of the affiliate site being crawled, e.g. `pointincome`
    pub fn source_site(mut self, site: impl Into<String>) -> CrawlConfigBuilder<Complete> {
        self.source_site = Some(site.into());
        self.into_state()
    }
}

impl CrawlConfigBuilder<Complete> {
    /// Validate ranges and produce the final configuration
    ///
    /// # Errors
    ///
    /// Returns an error when a required value is blank or a numeric option
    /// is outside its usable range.
    pub fn build(self) -> Result<CrawlConfig> {
        let storage_dir = self
            .storage_dir
            .ok_or_else(|| anyhow!("storage_dir is required"))?;
        let source_site = self
            .source_site
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("source_site must not be empty"))?;

        if source_site.contains(':') {
            return Err(anyhow!(
                "source_site '{source_site}' must not contain ':' (used as key separator)"
            ));
        }
        if self.max_retries == 0 {
            return Err(anyhow!("max_retries must be at least 1"));
        }
        if self.circuit_threshold == 0 {
            return Err(anyhow!("circuit_threshold must be at least 1"));
        }
        if self.max_pages_per_category == 0 {
            return Err(anyhow!("max_pages_per_category must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(anyhow!("batch_size must be at least 1"));
        }
        if self.parallel_workers == 0 {
            return Err(anyhow!("parallel_workers must be at least 1"));
        }
        if self.operation_timeout_ms == 0 {
            return Err(anyhow!("operation_timeout_ms must be greater than 0"));
        }
        if self.launch_timeout_ms == 0 {
            return Err(anyhow!("launch_timeout_ms must be greater than 0"));
        }
        if self.max_consecutive_structural_failures == 0 {
            return Err(anyhow!("max_consecutive_structural_failures must be at least 1"));
        }
        if let Some(rate) = self.point_exchange_rate
            && !(rate.is_finite() && rate > 0.0)
        {
            return Err(anyhow!("point_exchange_rate must be a positive number, got {rate}"));
        }

        Ok(CrawlConfig {
            storage_dir,
            source_site,
            rate_limit_ms: self.rate_limit_ms,
            max_retries: self.max_retries,
            circuit_threshold: self.circuit_threshold,
            cooldown_ms: self.cooldown_ms,
            max_pages_per_category: self.max_pages_per_category,
            batch_size: self.batch_size,
            parallel_workers: self.parallel_workers,
            operation_timeout_ms: self.operation_timeout_ms,
            launch_timeout_ms: self.launch_timeout_ms,
            retry_base_delay_ms: self.retry_base_delay_ms,
            max_backoff_ms: self.max_backoff_ms.max(self.retry_base_delay_ms),
            backoff: self.backoff,
            backoff_jitter: self.backoff_jitter,
            max_consecutive_structural_failures: self.max_consecutive_structural_failures,
            point_exchange_rate: self.point_exchange_rate,
            currency: self.currency,
            compress_backups: self.compress_backups,
        })
    }
}
