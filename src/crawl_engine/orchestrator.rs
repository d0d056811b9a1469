//! Crawl orchestrator
//!
//! Walks the category list, resuming from a checkpoint when one matches,
//! and drives one or more worker lanes. Each lane owns a renderer session
//! and claims categories from a shared cursor, so no two lanes ever hold the
//! same category. Cancellation is honored between categories only.

use futures::future::join_all;
use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::accumulator::Accumulator;
use super::category::{CategoryContext, crawl_category};
use super::crawl_types::{Category, CategoryReport, CategoryStatus, CrawlReport};
use super::progress::ProgressReporter;
use super::resilience::ResilienceController;
use crate::checkpoint::{Checkpoint, CheckpointManager};
use crate::config::CrawlConfig;
use crate::record::{Record, content_hash};
use crate::renderer::{RendererFactory, RendererSession};

/// Everything the crawl phase hands to the diff and persistence phase
#[derive(Debug)]
pub struct CrawlOutcome {
    pub report: CrawlReport,
    /// Deduplicated records, including those recovered from a checkpoint
    pub records: Vec<Record>,
    /// Categories that failed, drifted or were skipped in this run
    pub unfinished_category_ids: HashSet<String>,
}

impl CrawlOutcome {
    /// True when every category reached a final state and nothing was cancelled
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.report.cancelled
            && !self
                .report
                .categories
                .iter()
                .any(|c| c.status == CategoryStatus::Skipped)
    }
}

/// Fingerprint of a category list, stored in checkpoints
#[must_use]
pub fn category_fingerprint(categories: &[Category]) -> String {
    let parts: Vec<String> = categories
        .iter()
        .map(|c| format!("{}={}", c.id, c.url_template))
        .collect();
    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    content_hash(&refs)
}

pub struct CrawlOrchestrator {
    config: Arc<CrawlConfig>,
    controller: ResilienceController,
    progress: Arc<dyn ProgressReporter>,
}

impl CrawlOrchestrator {
    pub fn new(config: Arc<CrawlConfig>, progress: Arc<dyn ProgressReporter>) -> Self {
        let controller = ResilienceController::from_config(&config, Arc::clone(&progress));
        Self {
            config,
            controller,
            progress,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &ResilienceController {
        &self.controller
    }

    /// Crawl all categories not yet completed according to the checkpoint.
    ///
    /// Every category that reaches a final state is committed and
    /// checkpointed before the next one is claimed. The checkpoint is saved
    /// once more before returning, on every path.
    pub async fn run_crawl<F: RendererFactory>(
        &self,
        categories: &[Category],
        factory: &F,
        checkpoints: &CheckpointManager,
        cancel: &CancellationToken,
    ) -> CrawlOutcome {
        let fingerprint = category_fingerprint(categories);
        let checkpoint = checkpoints
            .load_matching(&fingerprint)
            .await
            .unwrap_or_else(|| Checkpoint::empty(Some(fingerprint.clone())));

        let mut reports: Vec<Option<CategoryReport>> = vec![None; categories.len()];
        let mut pending = Vec::new();
        for (index, category) in categories.iter().enumerate() {
            if checkpoint.is_completed(index) {
                reports[index] = Some(CategoryReport::new(
                    index,
                    &category.id,
                    CategoryStatus::Resumed,
                ));
            } else {
                pending.push(index);
            }
        }
        if !checkpoint.completed_category_indices.is_empty() {
            info!(
                target: "rewardscrape::orchestrator",
                "Resuming: {} of {} categories already complete, {} pending",
                categories.len() - pending.len(),
                categories.len(),
                pending.len()
            );
        }

        let accumulator = Accumulator::new(checkpoint);
        let errors = Mutex::new(Vec::new());
        let finished = Mutex::new(Vec::new());
        let cursor = AtomicUsize::new(0);
        let lanes = self.config.parallel_workers().min(pending.len());

        if lanes > 0 {
            let lane_futures = (0..lanes).map(|lane| {
                self.run_lane(
                    lane,
                    categories,
                    &pending,
                    &cursor,
                    factory,
                    &accumulator,
                    checkpoints,
                    cancel,
                    &finished,
                    &errors,
                )
            });
            join_all(lane_futures).await;
        }

        let cancelled = cancel.is_cancelled();
        let mut errors = errors.into_inner();
        if let Err(e) = accumulator.save(checkpoints).await {
            error!(target: "rewardscrape::checkpoint", "Final checkpoint save failed: {e}");
            errors.push(format!("checkpoint save failed: {e}"));
        }

        for report in finished.into_inner() {
            let index = report.index;
            reports[index] = Some(report);
        }
        let reports: Vec<CategoryReport> = reports
            .into_iter()
            .enumerate()
            .map(|(index, r)| {
                r.unwrap_or_else(|| {
                    CategoryReport::new(index, &categories[index].id, CategoryStatus::Skipped)
                })
            })
            .collect();

        let (records, failed_indices) = accumulator.into_parts();
        let mut unfinished: HashSet<String> = failed_indices
            .iter()
            .filter_map(|&i| categories.get(i))
            .map(|c| c.id.clone())
            .collect();
        unfinished.extend(
            reports
                .iter()
                .filter(|r| r.is_unfinished() || r.status == CategoryStatus::Skipped)
                .map(|r| r.category_id.clone()),
        );

        if cancelled {
            warn!(target: "rewardscrape::orchestrator", "Crawl cancelled; progress checkpointed");
        }

        CrawlOutcome {
            report: CrawlReport {
                total_records: records.len(),
                categories: reports,
                session_recycles: self.controller.recycles(),
                cancelled,
                errors,
            },
            records,
            unfinished_category_ids: unfinished,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_lane<F: RendererFactory>(
        &self,
        lane: usize,
        categories: &[Category],
        pending: &[usize],
        cursor: &AtomicUsize,
        factory: &F,
        accumulator: &Accumulator,
        checkpoints: &CheckpointManager,
        cancel: &CancellationToken,
        finished: &Mutex<Vec<CategoryReport>>,
        errors: &Mutex<Vec<String>>,
    ) {
        let mut session = match self.controller.open_session(factory).await {
            Ok(session) => session,
            Err(e) => {
                error!(target: "rewardscrape::orchestrator", "Lane {lane}: renderer session unavailable: {e}");
                errors
                    .lock()
                    .await
                    .push(format!("lane {lane}: renderer session unavailable: {e}"));
                return;
            }
        };

        let ctx = CategoryContext {
            config: &self.config,
            controller: &self.controller,
            progress: self.progress.as_ref(),
        };

        loop {
            if cancel.is_cancelled() {
                info!(target: "rewardscrape::orchestrator", "Lane {lane}: cancellation requested, stopping");
                break;
            }
            let slot = cursor.fetch_add(1, Ordering::AcqRel);
            let Some(&index) = pending.get(slot) else {
                break;
            };
            let category = &categories[index];

            self.progress.report_category_started(index, &category.id);
            let outcome = crawl_category(&ctx, &mut session, index, category).await;
            let unfinished = outcome.unfinished();
            let mut report = outcome.report;

            if let CategoryStatus::Failed { error } = &report.status {
                errors
                    .lock()
                    .await
                    .push(format!("category {}: {error}", category.id));
            }

            let (stats, saved) = accumulator
                .commit_category(index, outcome.records, unfinished, checkpoints)
                .await;
            report.records_accepted = stats.accepted;
            report.duplicates += stats.duplicates;
            if let Err(e) = saved {
                errors
                    .lock()
                    .await
                    .push(format!("checkpoint save after {} failed: {e}", category.id));
            }

            self.progress.report_category_finished(&report);
            finished.lock().await.push(report);
        }

        session.close().await;
    }
}
