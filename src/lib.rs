pub mod checkpoint;
pub mod config;
pub mod crawl_engine;
pub mod persistence;
pub mod record;
pub mod renderer;
pub mod snapshot;
pub mod utils;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointManager};
pub use config::{BackoffStrategy, CrawlConfig, CrawlOptions};
pub use crawl_engine::{
    Category, CategoryReport, CategoryStatus, CrawlError, CrawlOrchestrator, CrawlOutcome,
    CrawlReport, CrawlResult, FailureKind, FetchError, LogProgress, NoOpProgress,
    ProgressReporter, RunReport, StopReason, run_incremental,
};
pub use persistence::{BackupWriter, PersistSummary, PersistenceGateway, UpsertOutcome};
pub use record::{ContentSignature, Device, RawRecord, Record, RejectedReason, RewardUnit, RewardValue};
pub use renderer::{
    ChromiumRendererFactory, ChromiumSettings, ExtractedPage, RecordExtractor, RendererFactory,
    RendererSession, SelectorExtractor, SelectorExtractorConfig,
};
pub use snapshot::{BaselineStore, DeltaReport, DeltaSummary, DiffResult, Snapshot, diff};

/// Run one incremental crawl with log-backed progress and no external cancellation
pub async fn crawl<F, G>(
    config: CrawlConfig,
    categories: &[Category],
    factory: &F,
    gateway: &G,
) -> RunReport
where
    F: RendererFactory,
    G: PersistenceGateway + ?Sized,
{
    run_incremental(
        Arc::new(config),
        categories,
        factory,
        gateway,
        &CancellationToken::new(),
        Arc::new(LogProgress),
    )
    .await
}
