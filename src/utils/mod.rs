pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{collapse_whitespace, fold_width, normalize_title, safe_truncate_chars};
pub use url_utils::{canonicalize_url, page_url};
