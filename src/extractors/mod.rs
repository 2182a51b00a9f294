//! Extraction pipeline
//!
//! Pure functions from captured page markup to typed records. Identity
//! fields (urls, names, release dates and countries) are required and fail
//! the whole page when missing; descriptive fields are best-effort and only
//! log a warning. Output always follows document order.

pub mod activity;
pub mod credits;
pub mod details;
pub mod films;
pub mod movie;
pub mod releases;
pub mod review;
pub mod selectors;
pub mod taxonomy;
pub mod users;

use scraper::ElementRef;
use thiserror::Error;

pub use activity::{ActivityDraft, ActivityKind, extract_activities, parse_rating, split_actions};
pub use credits::{CAST_ROLE, extract_cast, extract_crew};
pub use details::{
    DetailSection, classify_detail_label, extract_countries, extract_languages, extract_studios,
};
pub use films::{extract_film_urls, extract_last_page};
pub use movie::{extract_movie, parse_duration};
pub use releases::extract_releases;
pub use review::extract_review;
pub use taxonomy::extract_genres_and_themes;
pub use users::extract_users;

/// Extraction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// A required field is absent or empty
    #[error("{entity}: required field '{field}' is missing")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    /// A required href could not be resolved to an absolute URL
    #[error("{entity}: invalid url '{href}'")]
    InvalidUrl { entity: &'static str, href: String },
}

pub type ExtractResult<T> = Result<T, ExtractError>;

pub(crate) fn missing(entity: &'static str, field: &'static str) -> ExtractError {
    ExtractError::MissingField { entity, field }
}

/// Trimmed text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first descendant matching `selector`, empty if none.
pub(crate) fn child_text(element: ElementRef<'_>, selector: &scraper::Selector) -> String {
    element
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// The next sibling that is an element, skipping text and comments.
pub(crate) fn next_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Resolve a required href against the site prefix.
pub(crate) fn require_url(
    prefix: &str,
    href: Option<&str>,
    entity: &'static str,
) -> ExtractResult<String> {
    let href = href
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| missing(entity, "url"))?;
    crate::utils::absolute_url(prefix, href).ok_or_else(|| ExtractError::InvalidUrl {
        entity,
        href: href.to_string(),
    })
}

/// Reject empty required text.
pub(crate) fn require_text(
    value: String,
    entity: &'static str,
    field: &'static str,
) -> ExtractResult<String> {
    if value.is_empty() {
        Err(missing(entity, field))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_next_element_skips_text_nodes() {
        let html = Html::parse_fragment("<div><h3>A</h3>\n  <!-- c --> <p>B</p></div>");
        let h3 = Selector::parse("h3").expect("selector");
        let header = html.select(&h3).next().expect("h3");
        let next = next_element(header).expect("sibling");
        assert_eq!(next.value().name(), "p");
        assert_eq!(element_text(next), "B");
    }

    #[test]
    fn test_require_url() {
        assert_eq!(
            require_url("https://letterboxd.com", Some("/film/x/"), "movie"),
            Ok("https://letterboxd.com/film/x/".to_string())
        );
        assert_eq!(
            require_url("https://letterboxd.com", Some(" "), "movie"),
            Err(missing("movie", "url"))
        );
        assert_eq!(
            require_url("https://letterboxd.com", None, "crew"),
            Err(missing("crew", "url"))
        );
    }
}
