//! Text folding helpers for listing content
//!
//! Affiliate listings mix full-width and half-width characters and pad
//! titles with irregular whitespace. These helpers produce stable forms for
//! identity and comparison without touching the displayed text.

/// Fold full-width ASCII variants and the ideographic space to half-width.
///
/// `１,２００ｐｔ` becomes `1,200pt`, `５％` becomes `5%`. Characters outside
/// the full-width ASCII block are returned unchanged.
#[must_use]
pub fn fold_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '￥' => '¥',
            _ => c,
        })
        .collect()
}

/// Collapse every whitespace run into one ASCII space and trim both ends
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity form of a title: width-folded, whitespace-collapsed, lowercased
#[must_use]
pub fn normalize_title(s: &str) -> String {
    collapse_whitespace(&fold_width(s)).to_lowercase()
}

/// Truncate to at most `max_chars` characters on a char boundary.
#[inline]
#[must_use]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}
