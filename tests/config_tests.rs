//! Tests for the type-safe configuration builder and options document

use rewardscrape::config::{BackoffStrategy, CrawlConfig, CrawlOptions};
use std::time::Duration;
use tempfile::TempDir;

mod common;

#[test]
fn test_builder_requires_storage_dir_and_source_site() {
    // These should not compile if uncommented:
    // CrawlConfig::builder().build();
    // CrawlConfig::builder().storage_dir("/tmp").build();

    let temp_dir = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path())
        .source_site("pointincome")
        .build()
        .unwrap();

    assert_eq!(config.storage_dir(), temp_dir.path());
    assert_eq!(config.source_site(), "pointincome");
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path())
        .source_site("moppy")
        .build()
        .unwrap();

    assert_eq!(config.rate_limit(), Duration::from_millis(2000));
    assert_eq!(config.max_retries(), 3);
    assert_eq!(config.circuit_threshold(), 5);
    assert_eq!(config.cooldown(), Duration::from_secs(30));
    assert_eq!(config.max_pages_per_category(), 20);
    assert_eq!(config.batch_size(), 50);
    assert_eq!(config.parallel_workers(), 1);
    assert_eq!(config.launch_timeout(), Duration::from_secs(180));
    assert_eq!(config.backoff(), BackoffStrategy::Exponential);
    assert!(config.backoff_jitter());
    assert_eq!(config.max_consecutive_structural_failures(), 2);
    assert_eq!(config.point_exchange_rate(), None);
    assert_eq!(config.currency(), "JPY");
    assert!(!config.compress_backups());
}

#[test]
fn test_derived_paths_live_under_storage_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config = common::test_config(temp_dir.path());

    assert_eq!(config.checkpoint_path(), temp_dir.path().join("checkpoint.json"));
    assert_eq!(config.baseline_path(), temp_dir.path().join("baseline.json"));
    assert_eq!(config.backup_dir(), temp_dir.path().join("backups"));
    assert_eq!(config.report_dir(), temp_dir.path().join("reports"));
}

#[test]
fn test_options_file_overlays_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("options.json");
    std::fs::write(
        &path,
        r#"{"rateLimitMs": 750, "parallelWorkers": 3, "backoff": "linear",
            "pointExchangeRate": 10, "compressBackups": true}"#,
    )
    .unwrap();

    let opts = CrawlOptions::load(&path).unwrap();
    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path())
        .source_site("hapitas")
        .options(&opts)
        .build()
        .unwrap();

    assert_eq!(config.rate_limit(), Duration::from_millis(750));
    assert_eq!(config.parallel_workers(), 3);
    assert_eq!(config.backoff(), BackoffStrategy::Linear);
    assert_eq!(config.point_exchange_rate(), Some(10.0));
    assert!(config.compress_backups());
    assert_eq!(config.max_retries(), 3);
}

#[test]
fn test_config_validation_logic() {
    let temp_dir = TempDir::new().unwrap();
    let base = || {
        CrawlConfig::builder()
            .storage_dir(temp_dir.path())
            .source_site("site")
    };

    assert!(base().max_retries(0).build().is_err());
    assert!(base().circuit_threshold(0).build().is_err());
    assert!(base().batch_size(0).build().is_err());
    assert!(base().parallel_workers(0).build().is_err());
    assert!(base().max_pages_per_category(0).build().is_err());
    assert!(base().operation_timeout_ms(0).build().is_err());
    assert!(base().launch_timeout_ms(0).build().is_err());
    assert!(base().point_exchange_rate(-1.0).build().is_err());
    assert!(base().point_exchange_rate(f64::NAN).build().is_err());

    let blank = CrawlConfig::builder().storage_dir(temp_dir.path()).source_site("  ");
    assert!(blank.build().is_err());
    let colon = CrawlConfig::builder().storage_dir(temp_dir.path()).source_site("a:b");
    assert!(colon.build().is_err());
}

#[test]
fn test_max_backoff_never_below_base_delay() {
    let temp_dir = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path())
        .source_site("site")
        .retry_base_delay_ms(5_000)
        .max_backoff_ms(1_000)
        .build()
        .unwrap();

    assert_eq!(config.max_backoff(), Duration::from_millis(5_000));
}

#[test]
fn test_options_reject_unknown_keys() {
    let err = CrawlOptions::from_json_str(r#"{"maxDepth": 3}"#).unwrap_err();
    assert!(format!("{err:#}").contains("maxDepth"));
}

#[test]
fn test_config_serialization() {
    let temp_dir = TempDir::new().unwrap();
    let config = common::test_config(temp_dir.path());
    let json = serde_json::to_string(&config).unwrap();
    let back: CrawlConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.source_site(), config.source_site());
    assert_eq!(back.batch_size(), config.batch_size());
}
