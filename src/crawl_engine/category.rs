//! Per-category page loop
//!
//! `Start → FetchingPage → ExtractingRecords → Continue | Stop`
//!
//! The loop stops on an empty page, a page whose content repeats an earlier
//! page of the same category, the page cap, or too many unreadable pages in
//! a row. Retry exhaustion or a fatal renderer error fails the category.

use chrono::Utc;
use futures::FutureExt;
use log::{debug, error, warn};
use std::collections::HashSet;

use super::crawl_types::{
    Category, CategoryReport, CategoryStatus, CrawlError, CrawlTask, StopReason, TaskStatus,
};
use super::progress::ProgressReporter;
use super::resilience::ResilienceController;
use crate::config::CrawlConfig;
use crate::record::{NormalizeContext, RawRecord, Record, content_hash, normalize};
use crate::renderer::RendererSession;
use crate::utils::url_utils::page_url;

/// Shared, read-only inputs of every category crawl
pub struct CategoryContext<'a> {
    pub config: &'a CrawlConfig,
    pub controller: &'a ResilienceController,
    pub progress: &'a dyn ProgressReporter,
}

/// Records gathered for one category plus its report
#[derive(Debug)]
pub struct CategoryOutcome {
    pub records: Vec<Record>,
    pub report: CategoryReport,
}

impl CategoryOutcome {
    #[must_use]
    pub fn unfinished(&self) -> bool {
        self.report.is_unfinished()
    }
}

/// Digest of a page's extracted records, used for repeat detection
fn records_hash(records: &[RawRecord]) -> String {
    let parts: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "{}\u{1e}{}\u{1e}{}\u{1e}{}\u{1e}{}",
                r.external_id.as_deref().unwrap_or_default(),
                r.title,
                r.reward_text,
                r.url.as_deref().unwrap_or_default(),
                r.device.as_deref().unwrap_or_default()
            )
        })
        .collect();
    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    content_hash(&refs)
}

/// Crawl every page of one category with the given session
pub async fn crawl_category<S: RendererSession>(
    ctx: &CategoryContext<'_>,
    session: &mut S,
    index: usize,
    category: &Category,
) -> CategoryOutcome {
    let config = ctx.config;
    let mut report = CategoryReport::new(
        index,
        &category.id,
        CategoryStatus::Completed {
            stop_reason: StopReason::PageCap,
        },
    );
    let mut records = Vec::new();
    let mut keys = HashSet::new();
    let mut page_hashes = HashSet::new();
    let mut structural_streak = 0u32;
    let mut stop_reason = None;

    for page in 1..=config.max_pages_per_category() {
        let Some(url) = page_url(&category.url_template, page) else {
            stop_reason = Some(StopReason::NoMorePages);
            break;
        };

        let mut task = CrawlTask::new(&category.id, page);
        task.status = TaskStatus::InFlight;

        let result = ctx
            .controller
            .with_resilience(session, &category.id, |s| {
                task.attempt_count += 1;
                let url = url.clone();
                async move { s.fetch_and_extract(&url).await }.boxed()
            })
            .await;

        let extracted = match result {
            Ok(extracted) => {
                task.status = TaskStatus::Succeeded;
                extracted
            }
            Err(CrawlError::Structural(msg)) => {
                task.status = TaskStatus::Abandoned;
                report.pages_skipped += 1;
                structural_streak += 1;
                warn!(
                    "Skipping {} page {page} ({url}): {msg} [{structural_streak} in a row]",
                    category.id
                );
                if structural_streak >= config.max_consecutive_structural_failures() {
                    stop_reason = Some(StopReason::StructuralDrift);
                    break;
                }
                continue;
            }
            Err(e) => {
                task.status = TaskStatus::Failed;
                error!(
                    "Category {} failed on page {page} after {} attempts: {e}",
                    category.id, task.attempt_count
                );
                report.status = CategoryStatus::Failed {
                    error: e.to_string(),
                };
                report.records_accepted = records.len();
                return CategoryOutcome { records, report };
            }
        };

        debug!("{task:?}");
        structural_streak = 0;
        report.pages_fetched += 1;
        ctx.progress
            .report_page_fetched(&category.id, page, extracted.records.len());

        if extracted.records.is_empty() {
            stop_reason = Some(StopReason::EmptyPage);
            break;
        }
        if !page_hashes.insert(records_hash(&extracted.records)) {
            debug!("{} page {page} repeats earlier content, stopping", category.id);
            stop_reason = Some(StopReason::RepeatedPage);
            break;
        }

        let norm_ctx = NormalizeContext {
            source_site: config.source_site(),
            category_id: &category.id,
            page_url: Some(&url),
            default_device: category.device,
            point_exchange_rate: config.point_exchange_rate(),
            currency: config.currency(),
            captured_at: Utc::now(),
        };
        for raw in &extracted.records {
            match normalize(raw, &norm_ctx) {
                Ok(record) => {
                    if keys.insert(record.canonical_key.clone()) {
                        records.push(record);
                    } else {
                        report.duplicates += 1;
                    }
                }
                Err(reason) => {
                    report.records_rejected += 1;
                    debug!("Dropped record {:?} from {}: {reason}", raw.title, category.id);
                }
            }
        }
    }

    report.status = CategoryStatus::Completed {
        stop_reason: stop_reason.unwrap_or(StopReason::PageCap),
    };
    report.records_accepted = records.len();
    CategoryOutcome { records, report }
}
