//! Renderer and extractor collaborator seam
//!
//! The crawl core only ever asks "render this URL and give me candidate
//! records". How a page is rendered and how records are read out of it
//! lives behind these traits. A Chromium implementation is provided; tests
//! plug in scripted fakes.

pub mod browser_setup;
pub mod chromium;
pub mod extractor;

use async_trait::async_trait;

use crate::crawl_engine::crawl_types::FetchError;
use crate::record::RawRecord;

pub use chromium::{ChromiumRendererFactory, ChromiumSession, ChromiumSettings};
pub use extractor::{RecordExtractor, SelectorExtractor, SelectorExtractorConfig};

/// Result of one successful fetch-and-extract call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Repeat detection hashes these, never the document they came from
    pub records: Vec<RawRecord>,
}

impl ExtractedPage {
    #[must_use]
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

/// A serially reusable rendering session
#[async_trait]
pub trait RendererSession: Send + Sync {
    /// Render `url` and extract candidate records from it
    async fn fetch_and_extract(&self, url: &str) -> Result<ExtractedPage, FetchError>;

    /// Tear the session down and bring up a fresh one in place
    async fn recycle(&mut self) -> Result<(), FetchError>;

    /// Release resources at the end of a worker lane
    async fn close(&mut self) {}
}

/// Creates one session per worker lane
#[async_trait]
pub trait RendererFactory: Send + Sync {
    type Session: RendererSession;

    async fn create_session(&self) -> Result<Self::Session, FetchError>;
}
