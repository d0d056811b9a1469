//! Test utilities shared by the rewardscrape integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use rewardscrape::{
    Category, CategoryReport, CrawlConfig, ExtractedPage, FetchError, PersistenceGateway,
    ProgressReporter, RawRecord, Record, RendererFactory, RendererSession, UpsertOutcome,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const SITE: &str = "shop";

/// What the scripted renderer does for one call
#[derive(Debug, Clone)]
pub enum Reply {
    Page(Vec<RawRecord>),
    Fail(FetchError),
    /// Never completes; only the operation timeout ends it
    Hang,
}

type Responder = dyn Fn(&str, u32) -> Reply + Send + Sync;

struct Shared {
    responder: Box<Responder>,
    calls: Mutex<Vec<String>>,
    per_url: Mutex<HashMap<String, u32>>,
    recycles: AtomicU32,
    sessions: AtomicU32,
    closed: AtomicU32,
    fail_sessions: AtomicBool,
    hang_create: AtomicBool,
    hang_recycle: AtomicBool,
}

async fn hang_if(flag: &AtomicBool) {
    if flag.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
    }
}

/// Renderer factory whose sessions answer from a closure.
///
/// The closure gets the URL and how many times that URL has been requested
/// so far (1-based), across all sessions.
#[derive(Clone)]
pub struct ScriptedFactory {
    shared: Arc<Shared>,
}

impl ScriptedFactory {
    pub fn new(responder: impl Fn(&str, u32) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
                per_url: Mutex::new(HashMap::new()),
                recycles: AtomicU32::new(0),
                sessions: AtomicU32::new(0),
                closed: AtomicU32::new(0),
                fail_sessions: AtomicBool::new(false),
                hang_create: AtomicBool::new(false),
                hang_recycle: AtomicBool::new(false),
            }),
        }
    }

    /// Serve a fixed catalog: URL → records. Unknown URLs are empty pages.
    pub fn catalog(pages: HashMap<String, Vec<RawRecord>>) -> Self {
        Self::new(move |url, _| Reply::Page(pages.get(url).cloned().unwrap_or_default()))
    }

    pub fn failing_sessions(self) -> Self {
        self.shared.fail_sessions.store(true, Ordering::SeqCst);
        self
    }

    /// `create_session` never completes
    pub fn hanging_session_start(self) -> Self {
        self.shared.hang_create.store(true, Ordering::SeqCst);
        self
    }

    /// `recycle` never completes
    pub fn hanging_recycle(self) -> Self {
        self.shared.hang_recycle.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }

    pub fn calls_for_category(&self, category_id: &str) -> usize {
        let prefix = format!("https://shop.test/{category_id}?");
        self.calls().iter().filter(|c| c.starts_with(&prefix)).count()
    }

    pub fn recycles(&self) -> u32 {
        self.shared.recycles.load(Ordering::SeqCst)
    }

    pub fn sessions_created(&self) -> u32 {
        self.shared.sessions.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> u32 {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

pub struct ScriptedSession {
    shared: Arc<Shared>,
}

#[async_trait]
impl RendererSession for ScriptedSession {
    async fn fetch_and_extract(&self, url: &str) -> Result<ExtractedPage, FetchError> {
        self.shared.calls.lock().unwrap().push(url.to_string());
        let nth = {
            let mut per_url = self.shared.per_url.lock().unwrap();
            let n = per_url.entry(url.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        match (self.shared.responder)(url, nth) {
            Reply::Page(records) => Ok(ExtractedPage::new(records)),
            Reply::Fail(err) => Err(err),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Err(FetchError::Transient("woke up".into()))
            }
        }
    }

    async fn recycle(&mut self) -> Result<(), FetchError> {
        self.shared.recycles.fetch_add(1, Ordering::SeqCst);
        hang_if(&self.shared.hang_recycle).await;
        Ok(())
    }

    async fn close(&mut self) {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RendererFactory for ScriptedFactory {
    type Session = ScriptedSession;

    async fn create_session(&self) -> Result<ScriptedSession, FetchError> {
        if self.shared.fail_sessions.load(Ordering::SeqCst) {
            return Err(FetchError::Fatal("browser launch failed".into()));
        }
        hang_if(&self.shared.hang_create).await;
        self.shared.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Gateway that keeps every batch in memory and can be told to fail
#[derive(Default)]
pub struct MemoryGateway {
    pub batches: Mutex<Vec<Vec<Record>>>,
    pub fail: AtomicBool,
}

impl MemoryGateway {
    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.fail.store(true, Ordering::SeqCst);
        gateway
    }

    pub fn received(&self) -> Vec<Record> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn upsert_batch(&self, records: &[Record]) -> anyhow::Result<UpsertOutcome> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("database unavailable");
        }
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(UpsertOutcome {
            saved_count: records.len(),
            updated_count: 0,
            errors: Vec::new(),
        })
    }
}

/// Progress reporter that cancels the run after `after` finished categories
pub struct CancelAfter {
    pub token: CancellationToken,
    pub after: usize,
    finished: AtomicUsize,
}

impl CancelAfter {
    pub fn new(token: CancellationToken, after: usize) -> Self {
        Self {
            token,
            after,
            finished: AtomicUsize::new(0),
        }
    }
}

impl ProgressReporter for CancelAfter {
    fn report_category_started(&self, _index: usize, _category_id: &str) {}

    fn report_page_fetched(&self, _category_id: &str, _page: u32, _records: usize) {}

    fn report_category_finished(&self, _report: &CategoryReport) {
        if self.finished.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.token.cancel();
        }
    }

    fn report_session_recycled(&self, _reason: &str) {}

    fn report_run_finished(&self, _success: bool) {}
}

/// Config with no pacing, tiny backoff and a short cooldown
pub fn test_config(dir: &Path) -> CrawlConfig {
    test_config_with(dir, |b| b)
}

pub fn test_config_with(
    dir: &Path,
    tweak: impl FnOnce(
        rewardscrape::config::CrawlConfigBuilder<rewardscrape::config::Complete>,
    ) -> rewardscrape::config::CrawlConfigBuilder<rewardscrape::config::Complete>,
) -> CrawlConfig {
    let builder = CrawlConfig::builder()
        .storage_dir(dir)
        .source_site(SITE)
        .rate_limit_ms(0)
        .retry_base_delay_ms(10)
        .max_backoff_ms(100)
        .backoff_jitter(false)
        .cooldown_ms(50)
        .operation_timeout_ms(1_000)
        .launch_timeout_ms(2_000)
        .max_pages_per_category(5);
    tweak(builder).build().unwrap()
}

pub fn category(id: &str) -> Category {
    Category::new(id, format!("https://shop.test/{id}?page={{page}}"))
}

pub fn categories(ids: &[&str]) -> Vec<Category> {
    ids.iter().map(|id| category(id)).collect()
}

pub fn page(category_id: &str, page: u32) -> String {
    format!("https://shop.test/{category_id}?page={page}")
}

pub fn offer(id: &str, title: &str, reward: &str) -> RawRecord {
    RawRecord::new(title, reward)
        .with_external_id(id)
        .with_url(format!("https://shop.test/ad/{id}"))
}

/// Canonical key the normalizer assigns to [`offer`] records
pub fn key(id: &str) -> String {
    format!("{SITE}:id:{id}")
}

/// Build a catalog where each category has the given offers on page 1
/// and an empty page 2.
pub fn single_page_catalog(entries: &[(&str, Vec<RawRecord>)]) -> HashMap<String, Vec<RawRecord>> {
    entries
        .iter()
        .map(|(cat, records)| (page(cat, 1), records.clone()))
        .collect()
}
