//! Raw record normalization

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::identity::canonical_key;
use super::reward::parse_reward;
use super::types::{Device, RawRecord, Record};
use crate::utils::string_utils::collapse_whitespace;
use crate::utils::url_utils::canonicalize_url;

/// Why a raw record was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectedReason {
    #[error("record has no title")]
    MissingTitle,
    #[error("no usable identity source (id, url or title with category)")]
    UndecidableKey,
}

/// Everything normalization needs besides the raw record itself
#[derive(Debug, Clone)]
pub struct NormalizeContext<'a> {
    pub source_site: &'a str,
    pub category_id: &'a str,
    /// URL of the listing page, used to resolve relative offer links
    pub page_url: Option<&'a str>,
    /// Device the category lists when the record carries no hint
    pub default_device: Option<Device>,
    pub point_exchange_rate: Option<f64>,
    pub currency: &'a str,
    pub captured_at: DateTime<Utc>,
}

/// Turn an extractor candidate into a [`Record`] or explain why it was dropped.
///
/// # Errors
///
/// `MissingTitle` when the title is blank, `UndecidableKey` when neither id,
/// URL nor title-with-category can identify the offer. An unparseable reward
/// is not an error; it is kept with `RewardUnit::Unknown`.
pub fn normalize(raw: &RawRecord, ctx: &NormalizeContext<'_>) -> Result<Record, RejectedReason> {
    let title = collapse_whitespace(&raw.title);
    if title.is_empty() {
        return Err(RejectedReason::MissingTitle);
    }

    let url = raw
        .url
        .as_deref()
        .and_then(|u| canonicalize_url(u, ctx.page_url));

    let external_id = raw
        .external_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let key = canonical_key(
        ctx.source_site,
        ctx.category_id,
        external_id.as_deref(),
        url.as_deref(),
        &title,
    )
    .ok_or(RejectedReason::UndecidableKey)?;

    let device = raw
        .device
        .as_deref()
        .and_then(Device::from_hint)
        .or(ctx.default_device)
        .unwrap_or_default();

    Ok(Record {
        source_site: ctx.source_site.to_string(),
        category_id: ctx.category_id.to_string(),
        external_id,
        canonical_key: key,
        title,
        reward_value: parse_reward(&raw.reward_text, ctx.point_exchange_rate, ctx.currency),
        url,
        device,
        captured_at: ctx.captured_at,
    })
}
