//! Details tab: studios, countries and languages
//!
//! Each section is introduced by an `h3` whose first span carries the label;
//! the values are the links in the element that follows it.

use scraper::{ElementRef, Html};
use tracing::debug;

use super::selectors::{DETAIL_HEADERS, FIRST_SPAN, PARAGRAPH_ANCHORS};
use super::{ExtractResult, child_text, element_text, next_element, require_text, require_url};
use crate::models::{CountryAndMovie, LanguageAndMovie, Studio};
use crate::utils::normalize_whitespace;

/// Which details section a header introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSection {
    Studios,
    Countries,
    Languages { primary: bool },
}

/// Map a details header label to its section. Unknown labels yield `None`.
#[must_use]
pub fn classify_detail_label(label: &str) -> Option<DetailSection> {
    match normalize_whitespace(label).as_str() {
        "Studio" | "Studios" => Some(DetailSection::Studios),
        "Country" | "Countries" => Some(DetailSection::Countries),
        "Language" | "Languages" | "Primary Language" | "Primary Languages" => {
            Some(DetailSection::Languages { primary: true })
        }
        "Spoken Language" | "Spoken Languages" => Some(DetailSection::Languages { primary: false }),
        _ => None,
    }
}

/// (section, value list) pairs in document order
fn sections(doc: &Html) -> impl Iterator<Item = (DetailSection, ElementRef<'_>)> {
    doc.select(&DETAIL_HEADERS).filter_map(|header| {
        let label = child_text(header, &FIRST_SPAN);
        let section = classify_detail_label(&label);
        if section.is_none() {
            debug!(%label, "skipping details section");
        }
        Some((section?, next_element(header)?))
    })
}

/// Link texts under a section, each required to be non-empty.
fn names(list: ElementRef<'_>, entity: &'static str) -> ExtractResult<Vec<String>> {
    list.select(&PARAGRAPH_ANCHORS)
        .map(|anchor| require_text(element_text(anchor), entity, "name"))
        .collect()
}

/// Production studios.
///
/// # Errors
///
/// A studio link without name or href.
pub fn extract_studios(doc: &Html, prefix: &str) -> ExtractResult<Vec<Studio>> {
    let mut studios = Vec::new();
    for (section, list) in sections(doc) {
        if section != DetailSection::Studios {
            continue;
        }
        for anchor in list.select(&PARAGRAPH_ANCHORS) {
            let name = require_text(element_text(anchor), "studio", "name")?;
            let url = require_url(prefix, anchor.value().attr("href"), "studio")?;
            studios.push(Studio::new(url, name));
        }
    }
    Ok(studios)
}

/// Production countries of movie `movie_id`.
///
/// # Errors
///
/// An empty country name.
pub fn extract_countries(doc: &Html, movie_id: i64) -> ExtractResult<Vec<CountryAndMovie>> {
    let mut countries = Vec::new();
    for (section, list) in sections(doc) {
        if section != DetailSection::Countries {
            continue;
        }
        countries.extend(
            names(list, "country")?
                .into_iter()
                .map(|country| CountryAndMovie { movie_id, country }),
        );
    }
    Ok(countries)
}

/// Primary and spoken languages of movie `movie_id`.
///
/// # Errors
///
/// An empty language name.
pub fn extract_languages(doc: &Html, movie_id: i64) -> ExtractResult<Vec<LanguageAndMovie>> {
    let mut languages = Vec::new();
    for (section, list) in sections(doc) {
        let DetailSection::Languages { primary } = section else {
            continue;
        };
        languages.extend(names(list, "language")?.into_iter().map(|language| {
            LanguageAndMovie {
                movie_id,
                language,
                is_primary: primary,
            }
        }));
    }
    Ok(languages)
}
