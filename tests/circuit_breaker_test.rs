//! Session recycling driven by retry exhaustion and fatal errors

use rewardscrape::checkpoint::CheckpointManager;
use rewardscrape::{CategoryStatus, CrawlOrchestrator, FetchError, NoOpProgress};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

mod common;
use common::*;

async fn crawl(
    dir: &TempDir,
    config: rewardscrape::CrawlConfig,
    ids: &[&str],
    factory: &ScriptedFactory,
) -> rewardscrape::CrawlOutcome {
    let orchestrator = CrawlOrchestrator::new(Arc::new(config), Arc::new(NoOpProgress));
    let checkpoints = CheckpointManager::new(dir.path().join("checkpoint.json"));
    orchestrator
        .run_crawl(&categories(ids), factory, &checkpoints, &CancellationToken::new())
        .await
}

#[tokio::test(start_paused = true)]
async fn always_failing_renderer_recycles_once_per_threshold() {
    let dir = TempDir::new().unwrap();
    let factory =
        ScriptedFactory::new(|_, _| Reply::Fail(FetchError::Transient("HTTP 503".into())));
    let config = test_config_with(dir.path(), |b| b.max_retries(2).circuit_threshold(2));
    let ids = ["a", "b", "c", "d", "e", "f"];

    let outcome = crawl(&dir, config, &ids, &factory).await;

    // one exhausted operation per category, threshold 2
    assert_eq!(factory.recycles(), 3);
    assert_eq!(outcome.report.session_recycles, 3);
    assert_eq!(factory.calls().len(), ids.len() * 2);
    assert!(outcome.report.categories.iter().all(|c| c.is_failed()));
    assert!(outcome.is_complete());
}

#[tokio::test(start_paused = true)]
async fn success_resets_consecutive_counter() {
    let dir = TempDir::new().unwrap();
    let factory = ScriptedFactory::new(|url, _| {
        if url.contains("/a?") || url.contains("/c?") {
            Reply::Fail(FetchError::Transient("connection reset".into()))
        } else {
            Reply::Page(Vec::new())
        }
    });
    let config = test_config_with(dir.path(), |b| b.max_retries(1).circuit_threshold(2));

    let outcome = crawl(&dir, config, &["a", "b", "c", "d"], &factory).await;

    assert_eq!(factory.recycles(), 0);
    assert_eq!(outcome.report.failed_category_ids(), ["a", "c"]);
}

#[tokio::test(start_paused = true)]
async fn fatal_error_recycles_immediately() {
    let dir = TempDir::new().unwrap();
    let factory = ScriptedFactory::new(|url, _| {
        if url.contains("/a?") {
            Reply::Fail(FetchError::Fatal("target closed".into()))
        } else if url.ends_with("page=1") {
            Reply::Page(vec![offer("b1", "B1", "1%")])
        } else {
            Reply::Page(Vec::new())
        }
    });
    let config = test_config_with(dir.path(), |b| b.max_retries(5));

    let outcome = crawl(&dir, config, &["a", "b"], &factory).await;

    assert_eq!(factory.calls_to(&page("a", 1)), 1);
    assert_eq!(factory.recycles(), 1);
    assert!(matches!(
        &outcome.report.categories[0].status,
        CategoryStatus::Failed { error } if error.contains("fatally")
    ));
    assert!(!outcome.report.categories[1].is_failed());
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_render_times_out_and_is_retried() {
    let dir = TempDir::new().unwrap();
    let factory = ScriptedFactory::new(|url, nth| {
        if url.ends_with("page=1") && nth == 1 {
            Reply::Hang
        } else if url.ends_with("page=1") {
            Reply::Page(vec![offer("1", "One", "1%")])
        } else {
            Reply::Page(Vec::new())
        }
    });

    let started = tokio::time::Instant::now();
    let outcome = crawl(&dir, test_config(dir.path()), &["a"], &factory).await;

    assert_eq!(factory.calls_to(&page("a", 1)), 2);
    assert_eq!(outcome.records.len(), 1);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn trip_sleeps_the_cooldown() {
    let dir = TempDir::new().unwrap();
    let factory =
        ScriptedFactory::new(|_, _| Reply::Fail(FetchError::Transient("HTTP 429".into())));
    let config = test_config_with(dir.path(), |b| {
        b.max_retries(1).circuit_threshold(1).cooldown_ms(30_000)
    });

    let started = tokio::time::Instant::now();
    let outcome = crawl(&dir, config, &["a"], &factory).await;

    assert_eq!(outcome.report.session_recycles, 1);
    assert!(started.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn hung_recycle_does_not_stall_the_lane() {
    let dir = TempDir::new().unwrap();
    let factory = ScriptedFactory::new(|url, _| {
        if url.contains("/a?") {
            Reply::Fail(FetchError::Fatal("target closed".into()))
        } else if url.ends_with("page=1") {
            Reply::Page(vec![offer("b1", "B1", "1%")])
        } else {
            Reply::Page(Vec::new())
        }
    })
    .hanging_recycle();

    let started = tokio::time::Instant::now();
    let outcome = crawl(&dir, test_config(dir.path()), &["a", "b"], &factory).await;

    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(factory.recycles(), 1);
    assert!(outcome.report.categories[0].is_failed());
    assert!(!outcome.report.categories[1].is_failed());
    assert_eq!(outcome.records.len(), 1);
}
