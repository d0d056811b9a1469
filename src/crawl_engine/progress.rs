//! Progress reporting abstraction for crawl runs
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting and
//! provides a no-op and a log-backed implementation.

use log::info;

use super::crawl_types::CategoryReport;

/// Trait for reporting crawl progress at key lifecycle events
///
/// Implementations can forward updates to channels, log them, or drive a UI.
pub trait ProgressReporter: Send + Sync {
    /// A worker lane claimed a category
    fn report_category_started(&self, index: usize, category_id: &str);

    /// A listing page was fetched and extracted
    fn report_page_fetched(&self, category_id: &str, page: u32, records: usize);

    /// A category reached a final state and was checkpointed
    fn report_category_finished(&self, report: &CategoryReport);

    /// A renderer session was recycled
    fn report_session_recycled(&self, reason: &str);

    /// The whole run finished
    fn report_run_finished(&self, success: bool);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_category_started(&self, _index: usize, _category_id: &str) {}

    #[inline(always)]
    fn report_page_fetched(&self, _category_id: &str, _page: u32, _records: usize) {}

    #[inline(always)]
    fn report_category_finished(&self, _report: &CategoryReport) {}

    #[inline(always)]
    fn report_session_recycled(&self, _reason: &str) {}

    #[inline(always)]
    fn report_run_finished(&self, _success: bool) {}
}

/// Progress reporter that writes each event to the `log` facade
#[derive(Debug, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report_category_started(&self, index: usize, category_id: &str) {
        info!(target: "rewardscrape::progress", "category #{index} ({category_id}) started");
    }

    fn report_page_fetched(&self, category_id: &str, page: u32, records: usize) {
        info!(target: "rewardscrape::progress", "{category_id} page {page}: {records} records");
    }

    fn report_category_finished(&self, report: &CategoryReport) {
        info!(
            target: "rewardscrape::progress",
            "category #{} ({}) finished: {:?}, {} pages, {} accepted, {} rejected, {} duplicates",
            report.index,
            report.category_id,
            report.status,
            report.pages_fetched,
            report.records_accepted,
            report.records_rejected,
            report.duplicates
        );
    }

    fn report_session_recycled(&self, reason: &str) {
        info!(target: "rewardscrape::progress", "renderer session recycled: {reason}");
    }

    fn report_run_finished(&self, success: bool) {
        info!(target: "rewardscrape::progress", "run finished, success={success}");
    }
}
