//! Canonical key derivation
//!
//! A key must survive every cosmetic change a listing goes through between
//! runs. Sources are tried from most to least stable: the site's own offer
//! id, the canonical offer URL, then the normalized title scoped to its
//! category.

use crate::utils::string_utils::{collapse_whitespace, fold_width, normalize_title};
use crate::utils::url_utils::canonicalize_url;

/// Derive the canonical key of an offer, or `None` when no source is usable.
///
/// `url` is expected to be absolute; relative links must be resolved by the
/// caller. The key never depends on title or reward once an id or URL is
/// present.
#[must_use]
pub fn canonical_key(
    source_site: &str,
    category_id: &str,
    external_id: Option<&str>,
    url: Option<&str>,
    title: &str,
) -> Option<String> {
    let site = source_site.trim();
    if site.is_empty() {
        return None;
    }

    if let Some(id) = external_id.map(|id| collapse_whitespace(&fold_width(id)))
        && !id.is_empty()
    {
        return Some(format!("{site}:id:{id}"));
    }

    if let Some(url) = url.and_then(|u| canonicalize_url(u, None)) {
        return Some(format!("{site}:url:{url}"));
    }

    let category = category_id.trim();
    let title = normalize_title(title);
    if category.is_empty() || title.is_empty() {
        return None;
    }
    Some(format!("{site}:title:{category}:{title}"))
}
