//! Popular members listing

use scraper::Html;
use tracing::debug;

use super::selectors::{MEMBER_ANCHOR, MEMBER_ROWS};
use super::{ExtractResult, element_text, missing, require_text, require_url};
use crate::models::User;

/// Users listed on one members page, in table order.
///
/// # Errors
///
/// A row without a name or profile link.
pub fn extract_users(doc: &Html, prefix: &str) -> ExtractResult<Vec<User>> {
    let mut users = Vec::new();

    for row in doc.select(&MEMBER_ROWS) {
        let anchor = row
            .select(&MEMBER_ANCHOR)
            .next()
            .ok_or_else(|| missing("user", "name"))?;

        let name = require_text(element_text(anchor), "user", "name")?;
        let url = require_url(prefix, anchor.value().attr("href"), "user")?;

        debug!(%name, %url, "user extracted");
        users.push(User::new(url, name));
    }

    Ok(users)
}
