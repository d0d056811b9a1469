//! Full incremental run
//!
//! crawl → carry forward failed categories → diff against the baseline →
//! delta report → batched persistence with backups → baseline save and
//! checkpoint clear. The last two happen only when every earlier step
//! succeeded, so a failed run is detected again on the next one.

use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::crawl_types::{Category, CrawlReport};
use super::orchestrator::CrawlOrchestrator;
use super::progress::ProgressReporter;
use crate::checkpoint::CheckpointManager;
use crate::config::CrawlConfig;
use crate::persistence::{BackupWriter, PersistSummary, PersistenceGateway, persist_in_batches};
use crate::renderer::RendererFactory;
use crate::snapshot::{BaselineStore, DeltaReport, DeltaSummary, Snapshot, diff};

/// Outcome of one `run_incremental` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub success: bool,
    pub crawl: CrawlReport,
    /// Absent when the crawl did not finish and nothing was diffed
    pub summary: Option<DeltaSummary>,
    /// Baseline entries kept for categories that failed or drifted this run
    pub carried_forward: usize,
    pub persist: Option<PersistSummary>,
    pub delta_report_path: Option<PathBuf>,
    pub errors: Vec<String>,
}

/// Move baseline entries of unfinished categories into `current`
/// when the current run did not see them. Returns how many were moved.
pub fn carry_forward(
    baseline: &Snapshot,
    current: &mut Snapshot,
    unfinished_category_ids: &HashSet<String>,
) -> usize {
    if unfinished_category_ids.is_empty() {
        return 0;
    }
    let mut carried = 0;
    for (key, entry) in baseline.iter() {
        if unfinished_category_ids.contains(&entry.last_seen_record.category_id)
            && current.insert_entry(key.clone(), entry.clone())
        {
            carried += 1;
        }
    }
    carried
}

/// Run one incremental crawl and hand the changes to `gateway`
pub async fn run_incremental<F, G>(
    config: Arc<CrawlConfig>,
    categories: &[Category],
    factory: &F,
    gateway: &G,
    cancel: &CancellationToken,
    progress: Arc<dyn ProgressReporter>,
) -> RunReport
where
    F: RendererFactory,
    G: PersistenceGateway + ?Sized,
{
    let run_id = Uuid::new_v4();
    info!(
        target: "rewardscrape::orchestrator",
        "Run {run_id}: {} categories for {}",
        categories.len(),
        config.source_site()
    );

    let checkpoints = CheckpointManager::new(config.checkpoint_path());
    let orchestrator = CrawlOrchestrator::new(Arc::clone(&config), Arc::clone(&progress));
    let outcome = orchestrator
        .run_crawl(categories, factory, &checkpoints, cancel)
        .await;

    let mut report = RunReport {
        run_id,
        success: false,
        errors: outcome.report.errors.clone(),
        crawl: outcome.report.clone(),
        summary: None,
        carried_forward: 0,
        persist: None,
        delta_report_path: None,
    };

    if !outcome.is_complete() {
        warn!(
            target: "rewardscrape::orchestrator",
            "Run {run_id} stopped before all categories finished; diff skipped, checkpoint kept"
        );
        progress.report_run_finished(false);
        return report;
    }

    let baseline_store = BaselineStore::new(config.baseline_path());
    let baseline = match baseline_store.load().await {
        Ok(Some(baseline)) => baseline,
        Ok(None) => {
            info!("No baseline at {}; every record is new", baseline_store.path().display());
            Snapshot::new()
        }
        Err(e) => {
            // diffing against nothing would report the whole catalog as new
            error!("Baseline unreadable, skipping diff: {e}");
            report.errors.push(format!("baseline load failed: {e}"));
            progress.report_run_finished(false);
            return report;
        }
    };

    let mut current = Snapshot::from_records(outcome.records);
    report.carried_forward = carry_forward(&baseline, &mut current, &outcome.unfinished_category_ids);
    if report.carried_forward > 0 {
        warn!(
            "Carried {} baseline records forward for failed categories: {:?}",
            report.carried_forward, outcome.unfinished_category_ids
        );
    }

    let delta = diff(&baseline, &current);
    let delta_report = DeltaReport::from_diff(&delta, current.len(), Utc::now());
    report.summary = Some(delta_report.summary.clone());
    info!(
        target: "rewardscrape::orchestrator",
        "Run {run_id}: {} new, {} updated, {} deleted, {} unchanged",
        delta.new.len(),
        delta.updated.len(),
        delta.deleted.len(),
        delta.unchanged_count
    );

    match delta_report.write_to_dir(&config.report_dir()) {
        Ok(path) => report.delta_report_path = Some(path),
        Err(e) => {
            error!("Delta report not written: {e:#}");
            report.errors.push(format!("delta report: {e:#}"));
        }
    }

    let changed = delta.changed_records();
    if !changed.is_empty() {
        let backup = BackupWriter::new(config.backup_dir(), &run_id, config.compress_backups());
        let summary = persist_in_batches(gateway, &changed, config.batch_size(), Some(&backup)).await;
        report.errors.extend(summary.errors.iter().cloned());
        report.persist = Some(summary);
    }

    let persisted = report.persist.as_ref().is_none_or(PersistSummary::is_clean);
    if persisted && report.delta_report_path.is_some() {
        match baseline_store.save(&current).await {
            Ok(()) => match checkpoints.clear().await {
                Ok(()) => report.success = true,
                Err(e) => report.errors.push(format!("checkpoint clear failed: {e}")),
            },
            Err(e) => {
                error!("Baseline not saved: {e}");
                report.errors.push(format!("baseline save failed: {e}"));
            }
        }
    } else {
        warn!(
            target: "rewardscrape::orchestrator",
            "Run {run_id} had errors; previous baseline and checkpoint kept"
        );
    }

    progress.report_run_finished(report.success);
    report
}
