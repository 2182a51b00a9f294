//! Releases tab
//!
//! Layout: one section per release type, each holding date groups, each
//! date group listing the countries that release happened in.

use scraper::Html;
use tracing::debug;

use super::selectors::{
    RELEASE_AGE_RATING, RELEASE_COUNTRIES, RELEASE_COUNTRY_NAME, RELEASE_DATE, RELEASE_HEADERS,
};
use super::{ExtractResult, child_text, element_text, next_element, require_text};
use crate::models::Release;
use crate::utils::normalize_whitespace;

/// Every (type, date, country) release of movie `movie_id`.
///
/// # Errors
///
/// A date group without a date, or a country row without a country name.
pub fn extract_releases(doc: &Html, movie_id: i64) -> ExtractResult<Vec<Release>> {
    let mut releases = Vec::new();

    for header in doc.select(&RELEASE_HEADERS) {
        let release_type = normalize_whitespace(&element_text(header));
        let Some(table) = next_element(header) else {
            continue;
        };

        for group in table.children().filter_map(scraper::ElementRef::wrap) {
            let date = require_text(child_text(group, &RELEASE_DATE), "release", "date")?;

            for row in group.select(&RELEASE_COUNTRIES) {
                let country =
                    require_text(child_text(row, &RELEASE_COUNTRY_NAME), "release", "country")?;
                let age_rating = Some(child_text(row, &RELEASE_AGE_RATING)).filter(|r| !r.is_empty());

                debug!(%release_type, %date, %country, ?age_rating, "release extracted");
                releases.push(Release {
                    movie_id,
                    date: date.clone(),
                    country,
                    release_type: release_type.clone(),
                    age_rating,
                });
            }
        }
    }

    Ok(releases)
}
