//! Cast and crew tabs

use scraper::Html;
use tracing::debug;

use super::selectors::{CAST_OVERFLOW, CAST_VISIBLE, CREW_HEADERS, FIRST_SPAN, PARAGRAPH_ANCHORS};
use super::{ExtractResult, child_text, element_text, next_element, require_text, require_url};
use crate::models::Crew;

/// Role assigned to every cast member
pub const CAST_ROLE: &str = "Actor";

/// Cast members: visible names first, then the collapsed overflow list.
///
/// # Errors
///
/// A cast link without href or name.
pub fn extract_cast(doc: &Html, prefix: &str) -> ExtractResult<Vec<Crew>> {
    doc.select(&CAST_VISIBLE)
        .chain(doc.select(&CAST_OVERFLOW))
        .map(|anchor| {
            let url = require_url(prefix, anchor.value().attr("href"), "cast")?;
            let name = require_text(element_text(anchor), "cast", "name")?;
            debug!(%name, %url, "cast extracted");
            Ok(Crew::new(url, name, CAST_ROLE))
        })
        .collect()
}

/// Crew members grouped under role headers (Director, Writer, ...).
///
/// # Errors
///
/// A crew link with an empty name or without href.
pub fn extract_crew(doc: &Html, prefix: &str) -> ExtractResult<Vec<Crew>> {
    let mut crews = Vec::new();

    for header in doc.select(&CREW_HEADERS) {
        let role = child_text(header, &FIRST_SPAN);
        debug!(%role, "crew role");

        let Some(list) = next_element(header) else {
            continue;
        };

        for anchor in list.select(&PARAGRAPH_ANCHORS) {
            let name = require_text(element_text(anchor), "crew", "name")?;
            let url = require_url(prefix, anchor.value().attr("href"), "crew")?;
            crews.push(Crew::new(url, name, role.clone()));
        }
    }

    Ok(crews)
}
