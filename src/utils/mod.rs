pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{normalize_whitespace, safe_truncate_chars};
pub use url_utils::{absolute_url, activity_url, films_by_date_url};
