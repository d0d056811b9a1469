//! Record shapes produced by extraction and normalization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate record as handed over by a record extractor.
///
/// Every field except the title may be missing or malformed; nothing here
/// is trusted until it passes through [`super::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub reward_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Free-form platform hint such as `iOS` or `Android`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl RawRecord {
    /// Minimal record with a title and reward text
    pub fn new(title: impl Into<String>, reward_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reward_text: reward_text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }
}

/// Platform an offer applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Device {
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "Android")]
    Android,
    #[default]
    #[serde(rename = "All")]
    All,
}

impl Device {
    /// Interpret an extractor hint; `None` when the hint says nothing usable
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        let h = hint.trim().to_lowercase();
        if h.is_empty() {
            return None;
        }
        let ios = h.contains("ios") || h.contains("iphone") || h.contains("ipad");
        let android = h.contains("android");
        match (ios, android) {
            (true, true) => Some(Self::All),
            (true, false) => Some(Self::Ios),
            (false, true) => Some(Self::Android),
            (false, false) => {
                if h == "pc" || h.contains("web") || h.contains("desktop") {
                    Some(Self::Pc)
                } else if h == "all" || h.contains("both") || h.contains("両方") {
                    Some(Self::All)
                } else {
                    None
                }
            }
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::Ios => "iOS",
            Self::Android => "Android",
            Self::All => "All",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardUnit {
    Percent,
    Points,
    Currency,
    Unknown,
}

/// Reward as displayed plus its normalized numeric form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardValue {
    pub raw: String,
    pub amount: Option<f64>,
    pub unit: RewardUnit,
    /// Currency label for `Currency` amounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl RewardValue {
    #[must_use]
    pub fn unknown(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            amount: None,
            unit: RewardUnit::Unknown,
            currency: None,
        }
    }

    /// Stable text used inside content signatures
    #[must_use]
    pub fn signature_text(&self) -> String {
        match self.amount {
            Some(amount) => format!(
                "{amount}|{:?}|{}",
                self.unit,
                self.currency.as_deref().unwrap_or_default()
            ),
            None => format!("raw:{}", self.raw.trim()),
        }
    }
}

/// A normalized catalog entry with a stable identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub source_site: String,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub canonical_key: String,
    pub title: String,
    pub reward_value: RewardValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub device: Device,
    pub captured_at: DateTime<Utc>,
}
