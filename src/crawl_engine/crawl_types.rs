//! Core types for crawl orchestration.
//!
//! Error taxonomy, failure classification, category and task descriptors,
//! and the per-category and whole-crawl reports.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::record::Device;

/// Outcome of a failed renderer/extractor call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network hiccup, stale session, upstream throttling
    #[error("transient failure: {0}")]
    Transient(String),
    /// The call exceeded its hard timeout
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    /// Page rendered but its structure could not be read
    #[error("structural failure: {0}")]
    Structural(String),
    /// The renderer session is gone
    #[error("fatal renderer failure: {0}")]
    Fatal(String),
}

impl FetchError {
    /// Build an error from a collaborator message using [`FailureKind::classify`]
    pub fn from_message(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match FailureKind::classify(&msg) {
            FailureKind::Fatal => Self::Fatal(msg),
            FailureKind::Structural => Self::Structural(msg),
            FailureKind::Transient => Self::Transient(msg),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transient(_) | Self::Timeout(_) => FailureKind::Transient,
            Self::Structural(_) => FailureKind::Structural,
            Self::Fatal(_) => FailureKind::Fatal,
        }
    }
}

/// Categorizes failures for retry decisions
///
/// - Transient failures are retried and feed the circuit breaker
/// - Structural failures skip the page without retrying
/// - Fatal failures recycle the renderer session at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    Structural,
    Fatal,
}

impl FailureKind {
    /// Classify an error message from a renderer that only reports strings
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();

        if msg.contains("browser closed")
            || msg.contains("browser disconnected")
            || msg.contains("target closed")
            || msg.contains("session closed")
            || msg.contains("session not found")
            || msg.contains("no response from the chromium instance")
            || msg.contains("websocket")
            || msg.contains("crash")
        {
            return Self::Fatal;
        }

        if msg.contains("selector")
            || msg.contains("no matches")
            || msg.contains("zero matches")
            || msg.contains("parse")
            || msg.contains("missing required")
        {
            return Self::Structural;
        }

        // timeouts, resets, 429/403 and unknowns are all worth retrying
        Self::Transient
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Errors escalated out of the resilience controller to the orchestrator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrawlError {
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: FetchError },
    #[error("renderer session failed fatally: {0}")]
    Fatal(String),
    #[error("page structure unreadable: {0}")]
    Structural(String),
    #[error("renderer session could not be created or recycled: {0}")]
    Session(String),
    #[error("crawl cancelled")]
    Cancelled,
}

impl CrawlError {
    /// Whether this error ends the category
    #[must_use]
    pub const fn is_category_fatal(&self) -> bool {
        !matches!(self, Self::Structural(_))
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// A paginated listing section of the source site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Listing URL with a `{page}` placeholder
    pub url_template: String,
    /// Device assumed for records that carry no hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
}

impl Category {
    pub fn new(id: impl Into<String>, url_template: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            url_template: url_template.into(),
            device: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    InFlight,
    Succeeded,
    Failed,
    Abandoned,
}

/// One page fetch owned by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub category_id: String,
    pub page_number: u32,
    pub attempt_count: u32,
    pub status: TaskStatus,
}

impl CrawlTask {
    pub fn new(category_id: impl Into<String>, page_number: u32) -> Self {
        Self {
            category_id: category_id.into(),
            page_number,
            attempt_count: 0,
            status: TaskStatus::Pending,
        }
    }
}

/// Why a category's page loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// Extractor returned zero records
    EmptyPage,
    /// Page content repeated an earlier page of the same category
    RepeatedPage,
    /// Per-category page cap reached
    PageCap,
    /// Too many structurally unreadable pages in a row
    StructuralDrift,
    /// URL template has no further pages
    NoMorePages,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "state")]
pub enum CategoryStatus {
    /// Finished in an earlier run, recovered from the checkpoint
    Resumed,
    Completed { stop_reason: StopReason },
    Failed { error: String },
    /// Never started because the run was cancelled
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    pub index: usize,
    pub category_id: String,
    pub status: CategoryStatus,
    pub pages_fetched: u32,
    pub pages_skipped: u32,
    pub records_accepted: usize,
    pub records_rejected: usize,
    pub duplicates: usize,
}

impl CategoryReport {
    pub fn new(index: usize, category_id: impl Into<String>, status: CategoryStatus) -> Self {
        Self {
            index,
            category_id: category_id.into(),
            status,
            pages_fetched: 0,
            pages_skipped: 0,
            records_accepted: 0,
            records_rejected: 0,
            duplicates: 0,
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, CategoryStatus::Failed { .. })
    }

    /// Failed, or stopped because its pages could no longer be read.
    /// Such a category's listing is unknown, so its baseline is kept.
    #[must_use]
    pub fn is_unfinished(&self) -> bool {
        self.is_failed()
            || self.status
                == CategoryStatus::Completed {
                    stop_reason: StopReason::StructuralDrift,
                }
    }
}

/// Summary of the crawl phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub categories: Vec<CategoryReport>,
    pub total_records: usize,
    pub session_recycles: u32,
    pub cancelled: bool,
    pub errors: Vec<String>,
}

impl CrawlReport {
    #[must_use]
    pub fn failed_category_ids(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| c.is_failed())
            .map(|c| c.category_id.as_str())
            .collect()
    }
}
