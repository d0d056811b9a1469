//! Crawl Engine Module
//!
//! Orchestration of category and page crawling, the resilience policy
//! around every renderer call, and the full incremental run pipeline.

// Sub-modules
pub mod accumulator;
pub mod category;
pub mod circuit_breaker;
pub mod crawl_types;
pub mod execution;
pub mod orchestrator;
pub mod page_timeout;
pub mod progress;
pub mod rate_limiter;
pub mod resilience;

// Re-exports for public API
pub use execution::{RunReport, carry_forward, run_incremental};

pub use orchestrator::{CrawlOrchestrator, CrawlOutcome, category_fingerprint};
pub use progress::{LogProgress, NoOpProgress, ProgressReporter};

pub use circuit_breaker::{CategoryHealth, CircuitBreaker};
pub use rate_limiter::OperationPacer;
pub use resilience::{ResilienceController, RetryPolicy};

pub use crawl_types::{
    Category, CategoryReport, CategoryStatus, CrawlError, CrawlReport, CrawlResult, FailureKind,
    FetchError, StopReason,
};
