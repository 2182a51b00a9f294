//! A user's films grid and its pagination

use scraper::Html;
use tracing::{debug, warn};

use super::selectors::{FILM_ANCHOR, FILM_ITEMS, FILMS_LAST_PAGE};
use super::{ExtractResult, element_text, missing, require_url};

/// Absolute movie URLs on one grid page, in grid order.
///
/// # Errors
///
/// A grid item without a film link.
pub fn extract_film_urls(doc: &Html, prefix: &str) -> ExtractResult<Vec<String>> {
    let mut urls = Vec::new();

    for item in doc.select(&FILM_ITEMS) {
        let anchor = item
            .select(&FILM_ANCHOR)
            .next()
            .ok_or_else(|| missing("film", "url"))?;
        let url = require_url(prefix, anchor.value().attr("href"), "film")?;

        debug!(%url, "movie url extracted");
        urls.push(url);
    }

    Ok(urls)
}

/// Number of grid pages, or `None` when there is no pagination.
#[must_use]
pub fn extract_last_page(doc: &Html) -> Option<u32> {
    let anchor = doc.select(&FILMS_LAST_PAGE).next()?;
    let text = element_text(anchor);
    match text.parse::<u32>() {
        Ok(page) if page > 0 => Some(page),
        _ => {
            warn!(text = %text, "unparseable last page number");
            None
        }
    }
}
