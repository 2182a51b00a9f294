//! Genres and themes tab

use scraper::{ElementRef, Html, Selector};

use super::selectors::{GENRE_HEADERS, PARAGRAPH_ANCHORS, THEME_ANCHORS};
use super::{ExtractResult, element_text, next_element, require_text, require_url};
use crate::models::{Genre, Theme};
use crate::utils::normalize_whitespace;

fn links(
    list: ElementRef<'_>,
    selector: &Selector,
    prefix: &str,
    entity: &'static str,
) -> ExtractResult<Vec<(String, String)>> {
    list.select(selector)
        .map(|anchor| {
            let name = require_text(element_text(anchor), entity, "name")?;
            let url = require_url(prefix, anchor.value().attr("href"), entity)?;
            Ok((url, name))
        })
        .collect()
}

/// Genres and themes, dispatched on the section label.
///
/// Theme lists also link to "similar films" pages; those are skipped.
///
/// # Errors
///
/// A genre or theme link without name or href.
pub fn extract_genres_and_themes(
    doc: &Html,
    prefix: &str,
) -> ExtractResult<(Vec<Genre>, Vec<Theme>)> {
    let mut genres = Vec::new();
    let mut themes = Vec::new();

    for header in doc.select(&GENRE_HEADERS) {
        let Some(list) = next_element(header) else {
            continue;
        };

        match normalize_whitespace(&element_text(header)).as_str() {
            "Genres" | "Genre" => genres.extend(
                links(list, &PARAGRAPH_ANCHORS, prefix, "genre")?
                    .into_iter()
                    .map(|(url, name)| Genre::new(url, name)),
            ),
            "Themes" | "Theme" => themes.extend(
                links(list, &THEME_ANCHORS, prefix, "theme")?
                    .into_iter()
                    .map(|(url, name)| Theme::new(url, name)),
            ),
            other => tracing::debug!(label = other, "skipping genre tab section"),
        }
    }

    Ok((genres, themes))
}
