//! Shared configuration constants for rewardscrape
//!
//! Default values used by the configuration builder, the resilience layer
//! and the persistence boundary, kept in one place to avoid magic numbers.

/// Default delay between two consecutive renderer operations: 2 seconds
///
/// Affiliate listing sites throttle aggressively. Two seconds between
/// page loads keeps a single worker well below typical 403 thresholds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 2_000;

/// Default number of attempts for one renderer operation (first try included)
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Consecutive retry-exhausted operations before the session is recycled
pub const DEFAULT_CIRCUIT_THRESHOLD: u32 = 5;

/// Pause after a forced session recycle: 30 seconds
pub const DEFAULT_COOLDOWN_MS: u64 = 30_000;

/// Hard cap on pages visited per category
pub const DEFAULT_MAX_PAGES_PER_CATEGORY: u32 = 20;

/// Records per persistence gateway call
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Worker lanes; 1 means strictly sequential crawling
pub const DEFAULT_PARALLEL_WORKERS: usize = 1;

/// Hard timeout for a single fetch-and-extract call: 45 seconds
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 45_000;

/// Hard timeout for starting or recycling a renderer session: 3 minutes,
/// long enough for a first-run browser download
pub const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 180_000;

/// Base delay for retry backoff
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Upper bound for any single backoff sleep
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;

/// Structurally broken pages in a row before a category is abandoned
pub const DEFAULT_MAX_CONSECUTIVE_STRUCTURAL_FAILURES: u32 = 2;

/// Currency label attached to fixed-amount and converted point rewards
pub const DEFAULT_CURRENCY: &str = "JPY";

/// Placeholder substituted with the page number in category URL templates
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// File names inside the storage directory
pub const CHECKPOINT_FILENAME: &str = "checkpoint.json";
pub const BASELINE_FILENAME: &str = "baseline.json";
pub const BACKUP_DIRNAME: &str = "backups";
pub const REPORT_DIRNAME: &str = "reports";

/// Chrome user agent string used by the Chromium renderer
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Query parameters stripped before a URL is used as identity
pub const TRACKING_PARAMS: &[&str] = &["ref", "fbclid", "gclid", "yclid", "_ga"];
