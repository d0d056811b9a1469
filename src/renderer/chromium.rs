//! Chromium-backed renderer sessions

use async_trait::async_trait;
use chromiumoxide::Page;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::browser_setup::{LaunchedBrowser, launch_browser, shutdown_browser};
use super::extractor::RecordExtractor;
use super::{ExtractedPage, RendererFactory, RendererSession};
use crate::crawl_engine::crawl_types::FetchError;

#[derive(Debug, Clone)]
pub struct ChromiumSettings {
    pub headless: bool,
    /// CDP request timeout handed to the browser
    pub navigation_timeout: Duration,
    /// Upper bound on waiting for `wait_selector` after navigation
    pub settle_delay: Duration,
    /// Element whose presence means client-side rendering is done
    pub wait_selector: Option<String>,
}

impl Default for ChromiumSettings {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(5),
            wait_selector: None,
        }
    }
}

pub struct ChromiumRendererFactory {
    settings: ChromiumSettings,
    extractor: Arc<dyn RecordExtractor>,
}

impl ChromiumRendererFactory {
    pub fn new(settings: ChromiumSettings, extractor: Arc<dyn RecordExtractor>) -> Self {
        Self {
            settings,
            extractor,
        }
    }
}

#[async_trait]
impl RendererFactory for ChromiumRendererFactory {
    type Session = ChromiumSession;

    async fn create_session(&self) -> Result<ChromiumSession, FetchError> {
        ChromiumSession::launch(self.settings.clone(), Arc::clone(&self.extractor)).await
    }
}

/// One browser process with its own throwaway profile
pub struct ChromiumSession {
    settings: ChromiumSettings,
    extractor: Arc<dyn RecordExtractor>,
    launched: Option<LaunchedBrowser>,
}

fn fresh_profile_dir() -> PathBuf {
    std::env::temp_dir().join(format!("rewardscrape_chrome_{}", uuid::Uuid::new_v4()))
}

/// Only the extracted records describe the page; the markup around them
/// carries nonces and timestamps that differ on every render.
fn extract_page(
    extractor: &dyn RecordExtractor,
    html: &str,
    url: &str,
) -> Result<ExtractedPage, FetchError> {
    Ok(ExtractedPage::new(extractor.extract(html, url)?))
}

fn cdp_error(context: &str, err: impl std::fmt::Display) -> FetchError {
    FetchError::from_message(format!("{context}: {err}"))
}

impl ChromiumSession {
    async fn launch(
        settings: ChromiumSettings,
        extractor: Arc<dyn RecordExtractor>,
    ) -> Result<Self, FetchError> {
        let launched = launch_browser(
            settings.headless,
            fresh_profile_dir(),
            settings.navigation_timeout,
        )
        .await
        .map_err(|e| FetchError::Fatal(format!("browser launch failed: {e:#}")))?;
        Ok(Self {
            settings,
            extractor,
            launched: Some(launched),
        })
    }

    async fn shutdown(&mut self) {
        if let Some(launched) = self.launched.take() {
            for err in shutdown_browser(launched).await {
                debug!("Session teardown: {err}");
            }
        }
    }

    async fn wait_until_rendered(&self, page: &Page) {
        let Some(selector) = self.settings.wait_selector.as_deref() else {
            return;
        };
        let start = Instant::now();
        let poll_interval = Duration::from_millis(200);
        loop {
            if page.find_element(selector).await.is_ok() {
                debug!("{selector} appeared after {:?}", start.elapsed());
                return;
            }
            if start.elapsed() >= self.settings.settle_delay {
                // the extractor decides whether an empty document is the end or drift
                debug!("{selector} not present after {:?}", self.settings.settle_delay);
                return;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn render(&self, page: &Page, url: &str) -> Result<String, FetchError> {
        page.goto(url)
            .await
            .map_err(|e| cdp_error("navigation failed", e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| cdp_error("waiting for page load failed", e))?;
        self.wait_until_rendered(page).await;
        page.content()
            .await
            .map_err(|e| cdp_error("reading page content failed", e))
    }
}

#[async_trait]
impl RendererSession for ChromiumSession {
    async fn fetch_and_extract(&self, url: &str) -> Result<ExtractedPage, FetchError> {
        let launched = self
            .launched
            .as_ref()
            .ok_or_else(|| FetchError::Fatal("browser closed".to_string()))?;

        let page = launched
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| cdp_error("opening tab failed", e))?;

        let html = self.render(&page, url).await;
        if let Err(e) = page.close().await {
            warn!("Failed to close tab for {url}: {e}");
        }
        let html = html?;

        extract_page(self.extractor.as_ref(), &html, url)
    }

    async fn recycle(&mut self) -> Result<(), FetchError> {
        info!("Recycling browser session");
        self.shutdown().await;
        let launched = launch_browser(
            self.settings.headless,
            fresh_profile_dir(),
            self.settings.navigation_timeout,
        )
        .await
        .map_err(|e| FetchError::Fatal(format!("browser relaunch failed: {e:#}")))?;
        self.launched = Some(launched);
        Ok(())
    }

    async fn close(&mut self) {
        self.shutdown().await;
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(launched) = self.launched.take() {
            launched.handler.abort();
            if let Err(e) = std::fs::remove_dir_all(&launched.user_data_dir) {
                debug!(
                    "Failed to remove profile dir {}: {e}",
                    launched.user_data_dir.display()
                );
            }
        }
    }
}
