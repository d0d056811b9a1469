//! URL manipulation utilities.
//!
//! Canonicalization used for identity derivation and page URL expansion
//! for paginated category templates.

use url::Url;

use super::constants::{PAGE_PLACEHOLDER, TRACKING_PARAMS};

fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

/// Canonicalize a listing or offer URL so it can serve as identity.
///
/// Relative links are resolved against `base` when one is given. The
/// fragment and tracking parameters are dropped, remaining parameters are
/// sorted, and a trailing slash on a non-root path is trimmed. Scheme and
/// host are lowercased by the `url` parser already.
///
/// Returns `None` for empty input, non-http(s) schemes, or links that
/// cannot be resolved.
#[must_use]
pub fn canonicalize_url(raw: &str, base: Option<&str>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') || raw.starts_with("javascript:") {
        return None;
    }

    let mut parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(base?).ok()?;
            base.join(raw).ok()?
        }
        Err(_) => return None,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    parsed.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(pairs.iter());
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    Some(parsed.to_string())
}

/// Expand a category URL template for the given page number.
///
/// Templates without a `{page}` placeholder only describe page 1; any later
/// page yields `None`, which ends the category.
#[must_use]
pub fn page_url(template: &str, page: u32) -> Option<String> {
    if template.contains(PAGE_PLACEHOLDER) {
        Some(template.replace(PAGE_PLACEHOLDER, &page.to_string()))
    } else if page == 1 {
        Some(template.to_string())
    } else {
        None
    }
}
