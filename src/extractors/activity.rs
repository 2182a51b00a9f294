//! Activity page of one user for one movie
//!
//! Each activity row carries a timestamp and an action phrase such as
//! "watched, liked and rated". Rows sharing a date collapse into one draft.
//! Reviews live on a separate page; the draft only records its URL and the
//! orchestrator fetches the text.

use chrono::{DateTime, NaiveDate};
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::selectors::{
    ACTIVITY_CONTEXT, ACTIVITY_RATING, ACTIVITY_REVIEW_LINK, ACTIVITY_ROWS, ACTIVITY_TIME,
};
use super::child_text;
use crate::utils::absolute_url;

const FULL_STAR: char = '★';
const HALF_STAR: char = '½';

/// A recognised action verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Watched,
    Liked,
    Rated,
    Reviewed,
}

impl ActivityKind {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "watched" | "rewatched" => Some(Self::Watched),
            "liked" => Some(Self::Liked),
            "rated" => Some(Self::Rated),
            "reviewed" => Some(Self::Reviewed),
            _ => None,
        }
    }
}

/// Everything one user did to one movie on one date, before ids are known
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivityDraft {
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub is_watched: bool,
    pub is_loved: bool,
    pub rating: Option<f64>,
    /// Absolute URL of the review page, when the user reviewed that day
    pub review_url: Option<String>,
}

impl ActivityDraft {
    fn merge(&mut self, other: Self) {
        self.is_watched |= other.is_watched;
        self.is_loved |= other.is_loved;
        if self.rating.is_none() {
            self.rating = other.rating;
        }
        if self.review_url.is_none() {
            self.review_url = other.review_url;
        }
    }
}

/// Split an action phrase on commas and the word "and" in one pass.
///
/// Tokens are trimmed; empty tokens are dropped.
#[must_use]
pub fn split_actions(phrase: &str) -> Vec<String> {
    fn flush(current: &mut String, tokens: &mut Vec<String>) {
        let token = current.trim();
        if !token.is_empty() {
            tokens.push(token.to_string());
        }
        current.clear();
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut word = String::new();

    for c in phrase.chars().chain(std::iter::once(' ')) {
        if c == ',' || c.is_whitespace() {
            if word == "and" {
                flush(&mut current, &mut tokens);
            } else if !word.is_empty() {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&word);
            }
            word.clear();

            if c == ',' {
                flush(&mut current, &mut tokens);
            }
        } else {
            word.push(c);
        }
    }
    flush(&mut current, &mut tokens);

    tokens
}

/// Calendar date of an activity timestamp.
///
/// Timestamps are RFC 3339 (`2024-03-01T20:00:00.000Z`); the date is taken in
/// the timestamp's own offset. A bare `YYYY-MM-DD` prefix is accepted too.
#[must_use]
pub fn activity_date(timestamp: &str) -> Option<String> {
    let timestamp = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.date_naive().to_string());
    }
    timestamp
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .map(|date| date.to_string())
}

/// Rating from star glyphs: each full star is 1.0, each half star 0.5.
#[must_use]
pub fn parse_rating(stars: &str) -> Option<f64> {
    let full = stars.chars().filter(|&c| c == FULL_STAR).count();
    let half = stars.chars().filter(|&c| c == HALF_STAR).count();
    if full == 0 && half == 0 {
        return None;
    }
    Some(full as f64 + half as f64 * 0.5)
}

fn extract_row(row: ElementRef<'_>, date: String, prefix: &str) -> ActivityDraft {
    let mut draft = ActivityDraft {
        date,
        ..ActivityDraft::default()
    };

    for token in split_actions(&child_text(row, &ACTIVITY_CONTEXT)) {
        match ActivityKind::parse(&token) {
            Some(ActivityKind::Watched) => draft.is_watched = true,
            Some(ActivityKind::Liked) => draft.is_loved = true,
            Some(ActivityKind::Rated) => {
                draft.rating = parse_rating(&child_text(row, &ACTIVITY_RATING));
                if draft.rating.is_none() {
                    warn!(date = %draft.date, "rated activity without stars");
                }
            }
            Some(ActivityKind::Reviewed) => {
                draft.review_url = row
                    .select(&ACTIVITY_REVIEW_LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| absolute_url(prefix, href));
                if draft.review_url.is_none() {
                    warn!(date = %draft.date, "review url is empty, skipping");
                }
            }
            None => debug!(%token, "ignoring activity token"),
        }
    }

    draft
}

/// Activity drafts merged by calendar date, in order of first appearance.
///
/// Rows without a readable timestamp are logged and skipped.
#[must_use]
pub fn extract_activities(doc: &Html, prefix: &str) -> Vec<ActivityDraft> {
    let mut drafts: Vec<ActivityDraft> = Vec::new();

    for row in doc.select(&ACTIVITY_ROWS) {
        let Some(date) = row
            .select(&ACTIVITY_TIME)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .and_then(activity_date)
        else {
            warn!(
                activity_id = row.value().attr("data-activity-id").unwrap_or_default(),
                "activity date not found, skipping"
            );
            continue;
        };

        let draft = extract_row(row, date, prefix);
        match drafts.iter_mut().find(|d| d.date == draft.date) {
            Some(existing) => existing.merge(draft),
            None => drafts.push(draft),
        }
    }

    drafts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PREFIX: &str = "https://letterboxd.com";

    fn row(id: u32, date: Option<&str>, context: &str, extra: &str) -> String {
        let time = date
            .map(|d| format!(r#"<time datetime="{d}">date</time>"#))
            .unwrap_or_default();
        format!(
            r#"<section class="activity-row" data-activity-id="{id}"><div><p>
                <a href="/alice/"><strong>Alice</strong><span class="context"> {context} </span></a>
                {extra}
            </p></div><span class="nobr">{time}</span></section>"#
        )
    }

    fn page(rows: &[String]) -> Html {
        Html::parse_document(&format!(
            r#"<div id="activity-table-body">{}<section class="activity-row no-activity-message"><p>End</p></section></div>"#,
            rows.concat()
        ))
    }

    #[test]
    fn test_split_actions() {
        assert_eq!(split_actions("watched, liked and rated"), ["watched", "liked", "rated"]);
        assert_eq!(split_actions(" reviewed "), ["reviewed"]);
        assert_eq!(split_actions("rewatched and liked"), ["rewatched", "liked"]);
        assert!(split_actions(" , and ").is_empty());
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("★★★½"), Some(3.5));
        assert_eq!(parse_rating(" ★★★★★ "), Some(5.0));
        assert_eq!(parse_rating("½"), Some(0.5));
        assert_eq!(parse_rating(""), None);
    }

    #[test]
    fn test_watched_liked_and_rated() {
        let doc = page(&[row(
            1,
            Some("2024-03-01T20:00:00.000Z"),
            "watched, liked and rated",
            r#"<span class="rating rated-7">★★★½</span>"#,
        )]);
        let drafts = extract_activities(&doc, PREFIX);
        assert_eq!(
            drafts,
            vec![ActivityDraft {
                date: "2024-03-01".into(),
                is_watched: true,
                is_loved: true,
                rating: Some(3.5),
                review_url: None,
            }]
        );
    }

    #[test]
    fn test_reviewed_records_review_url_only() {
        let doc = page(&[row(
            2,
            Some("2024-03-02T10:00:00.000Z"),
            "reviewed",
            r#"<a class="target" href="/alice/film/heat-1995/">Heat</a>"#,
        )]);
        let drafts = extract_activities(&doc, PREFIX);
        assert_eq!(drafts.len(), 1);
        assert!(!drafts[0].is_watched);
        assert!(!drafts[0].is_loved);
        assert_eq!(drafts[0].rating, None);
        assert_eq!(
            drafts[0].review_url.as_deref(),
            Some("https://letterboxd.com/alice/film/heat-1995/")
        );
    }

    #[test]
    fn test_activity_date() {
        assert_eq!(activity_date("2024-03-01T20:00:00.000Z").as_deref(), Some("2024-03-01"));
        assert_eq!(activity_date(" 2024-03-01T23:30:00-05:00 ").as_deref(), Some("2024-03-01"));
        assert_eq!(activity_date("2024-03-01").as_deref(), Some("2024-03-01"));
        assert_eq!(activity_date("yesterday"), None);
        assert_eq!(activity_date(""), None);
    }

    #[test]
    fn test_same_day_rows_at_different_times_merge() {
        let doc = page(&[
            row(1, Some("2024-03-01T20:00:00.000Z"), "watched", ""),
            row(
                2,
                Some("2024-03-01T21:30:00.000Z"),
                "reviewed",
                r#"<a class="target" href="/alice/film/heat-1995/">Heat</a>"#,
            ),
        ]);
        let drafts = extract_activities(&doc, PREFIX);

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].date, "2024-03-01");
        assert!(drafts[0].is_watched);
        assert_eq!(
            drafts[0].review_url.as_deref(),
            Some("https://letterboxd.com/alice/film/heat-1995/")
        );
    }

    #[test]
    fn test_same_date_rows_merge_and_undated_rows_skip() {
        let doc = page(&[
            row(1, Some("2024-03-01T08:00:00.000Z"), "liked", ""),
            row(2, None, "watched", ""),
            row(3, Some("2023-12-24T09:00:00.000Z"), "watched", ""),
            row(4, Some("not a date"), "watched", ""),
            row(
                5,
                Some("2024-03-01T20:00:00.000Z"),
                "reviewed",
                r#"<a class="target" href="/alice/film/heat-1995/">Heat</a>"#,
            ),
        ]);
        let drafts = extract_activities(&doc, PREFIX);

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].date, "2024-03-01");
        assert!(drafts[0].is_loved);
        assert!(drafts[0].review_url.is_some());
        assert!(!drafts[0].is_watched);
        assert_eq!(drafts[1].date, "2023-12-24");
        assert!(drafts[1].is_watched);
    }

    proptest! {
        #[test]
        fn split_actions_recovers_verbs(verbs in prop::collection::vec(
            prop::sample::select(vec!["watched", "rewatched", "liked", "rated", "reviewed"]),
            1..6,
        ), use_and in any::<bool>()) {
            let phrase = match verbs.split_last() {
                Some((last, rest)) if use_and && !rest.is_empty() => {
                    format!("{} and {last}", rest.join(", "))
                }
                _ => verbs.join(", "),
            };
            prop_assert_eq!(split_actions(&phrase), verbs);
        }

        #[test]
        fn split_actions_never_yields_delimiters(phrase in "[a-z ,]{0,40}") {
            for token in split_actions(&phrase) {
                prop_assert!(!token.contains(','));
                prop_assert!(!token.is_empty());
                prop_assert!(token.split(' ').all(|w| w != "and"));
                prop_assert_eq!(token.trim(), token.as_str());
            }
        }
    }
}
