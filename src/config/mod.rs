//! Configuration module for incremental catalog crawling
//!
//! This module provides the `CrawlConfig` struct, its type-safe builder and
//! the JSON options document operators use to tune a run.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod options;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, CrawlConfigBuilder, WithStorageDir};
pub use options::CrawlOptions;
pub use types::{BackoffStrategy, CrawlConfig};
