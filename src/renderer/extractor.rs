//! CSS-selector driven record extraction

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::crawl_engine::crawl_types::FetchError;
use crate::record::RawRecord;
use crate::utils::collapse_whitespace;

/// Turns a rendered document into candidate records
pub trait RecordExtractor: Send + Sync {
    /// # Errors
    ///
    /// `Structural` when the document does not have the expected shape.
    fn extract(&self, html: &str, page_url: &str) -> Result<Vec<RawRecord>, FetchError>;
}

/// Selectors for one listing layout. All but `item` and `title` are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorExtractorConfig {
    /// One match per offer
    pub item: String,
    /// Relative to the item
    pub title: String,
    #[serde(default)]
    pub reward: Option<String>,
    /// Anchor whose `href` is the offer link
    #[serde(default)]
    pub link: Option<String>,
    /// Item attribute holding the external id, e.g. `data-id`
    #[serde(default)]
    pub id_attr: Option<String>,
    /// Regex with one capture group that pulls the id out of the link
    #[serde(default)]
    pub id_regex: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    /// Element a site shows once the listing is exhausted
    #[serde(default)]
    pub end_marker: Option<String>,
}

#[derive(Debug)]
pub struct SelectorExtractor {
    item: Selector,
    title: Selector,
    reward: Option<Selector>,
    link: Option<Selector>,
    id_attr: Option<String>,
    id_regex: Option<Regex>,
    device: Option<Selector>,
    end_marker: Option<Selector>,
    item_source: String,
}

fn parse_selector(kind: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid {kind} selector {css:?}: {e}"))
}

fn parse_optional(kind: &str, css: Option<&str>) -> Result<Option<Selector>> {
    css.map(|css| parse_selector(kind, css)).transpose()
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

impl SelectorExtractor {
    /// Compile a selector set
    ///
    /// # Errors
    ///
    /// Returns an error for any selector or regex that does not parse.
    pub fn new(config: &SelectorExtractorConfig) -> Result<Self> {
        let id_regex = config
            .id_regex
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("invalid id regex")?;
        Ok(Self {
            item: parse_selector("item", &config.item)?,
            title: parse_selector("title", &config.title)?,
            reward: parse_optional("reward", config.reward.as_deref())?,
            link: parse_optional("link", config.link.as_deref())?,
            id_attr: config.id_attr.clone(),
            id_regex,
            device: parse_optional("device", config.device.as_deref())?,
            end_marker: parse_optional("end marker", config.end_marker.as_deref())?,
            item_source: config.item.clone(),
        })
    }

    fn first_text(&self, item: ElementRef<'_>, selector: Option<&Selector>) -> Option<String> {
        selector
            .and_then(|s| item.select(s).next())
            .map(element_text)
            .and_then(non_empty)
    }

    fn read_item(&self, item: ElementRef<'_>) -> RawRecord {
        let title = item
            .select(&self.title)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let url = self
            .link
            .as_ref()
            .and_then(|s| item.select(s).next())
            .or_else(|| (item.value().name() == "a").then_some(item))
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .map(str::to_string)
            .and_then(non_empty);

        let external_id = self
            .id_attr
            .as_deref()
            .and_then(|attr| item.value().attr(attr))
            .map(|v| v.trim().to_string())
            .and_then(non_empty)
            .or_else(|| {
                let re = self.id_regex.as_ref()?;
                let caps = re.captures(url.as_deref()?)?;
                caps.get(1).map(|m| m.as_str().to_string())
            });

        RawRecord {
            external_id,
            title,
            reward_text: self
                .first_text(item, self.reward.as_ref())
                .unwrap_or_default(),
            url,
            device: self.first_text(item, self.device.as_ref()),
        }
    }
}

impl RecordExtractor for SelectorExtractor {
    fn extract(&self, html: &str, page_url: &str) -> Result<Vec<RawRecord>, FetchError> {
        if html.trim().is_empty() {
            return Err(FetchError::Transient(format!("empty document for {page_url}")));
        }
        let document = Html::parse_document(html);
        let records: Vec<RawRecord> = document
            .select(&self.item)
            .map(|item| self.read_item(item))
            .collect();

        if records.is_empty()
            && let Some(marker) = &self.end_marker
            && document.select(marker).next().is_none()
        {
            return Err(FetchError::Structural(format!(
                "item selector {:?} had zero matches on {page_url}",
                self.item_source
            )));
        }
        Ok(records)
    }
}
