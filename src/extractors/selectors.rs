//! CSS selectors for the crawled site
//!
//! Raw strings are used by the browser (waits, clicks, probes); the parsed
//! `Selector`s by the extractors. Parsing happens once, on first use.

use std::sync::LazyLock;

use scraper::Selector;

macro_rules! selector {
    ($name:ident, $css:literal) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| {
            Selector::parse($css)
                .expect(concat!("BUG: hardcoded CSS selector '", $css, "' is invalid"))
        });
    };
}

// Browser-side selectors

/// Last member row; visible once the members table has rendered
pub const MEMBERS_LAST_ROW: &str = "#content > div > div > section > table > tbody > tr:last-child";

pub const FILMS_LAST_POSTER: &str =
    "#content > div > div > section > div.poster-grid > ul > li:last-child > div > div > a > span.overlay";

pub const FILMS_NEXT_BUTTON: &str =
    "#content > div > div > section > div.pagination > div:nth-child(2) > a";

/// Highlighted page number in the paginator
pub const FILMS_CURRENT_PAGE: &str =
    "#content > div > div > section > div.pagination > div.paginate-pages > ul > li.paginate-current";

pub const MOVIE_BACKDROP_PROBE: &str = "#backdrop";

pub const MOVIE_BACKDROP_LOADED: &str = "body.backdrop-loaded";

pub const MOVIE_POSTER_LOADED: &str = "#js-poster-col > section.poster-list.-p230.-single.no-hover.el.col > div.react-component > div > img[srcset]";

pub const ACTIVITY_TABLE_END: &str =
    "#activity-table-body > section.activity-row.no-activity-message > p";

pub const REVIEW_POSTER: &str = "#content > div > div > section > div.col-4.gutter-right-1 > section.poster-list.-p150.el.col.viewing-poster-container > div > div > a > span.overlay";

pub const REVIEW_SPOILER_BUTTON: &str = "#content > div > div > section > section > div.review.body-text.-prose.-hero.-loose > div.js-spoiler-container > div > div > a";

// Members listing
selector!(MEMBER_ROWS, "#content > div > div > section > table > tbody > tr");
selector!(MEMBER_ANCHOR, "td > div > h3 > a");

// Films grid
selector!(FILM_ITEMS, "#content > div > div > section > div.poster-grid > ul > li");
selector!(FILM_ANCHOR, "div > div > a");
selector!(
    FILMS_LAST_PAGE,
    "#content > div > div > section > div.pagination > div.paginate-pages > ul > li:last-child > a"
);

// Movie page
selector!(
    MOVIE_NAME,
    "#film-page-wrapper > div.col-17 > section.production-masthead.-shadowed.-productionscreen.-film > div > h1 > span"
);
selector!(
    MOVIE_FOOTER,
    "#film-page-wrapper > div.col-17 > section.section.col-10.col-main > p"
);
selector!(
    MOVIE_POSTER,
    "#js-poster-col > section.poster-list.-p230.-single.no-hover.el.col > div.react-component > div > img"
);
selector!(MOVIE_BACKDROP, "#backdrop > div.backdropimage.js-backdrop-image");
selector!(MOVIE_DESCRIPTION, "meta[property='og:description']");
selector!(MOVIE_TRAILER, "p.trailer-link > a.play");

// Credits
selector!(CAST_VISIBLE, "#tab-cast > div > p > a:not([id=\"has-cast-overflow\"])");
selector!(CAST_OVERFLOW, "#tab-cast > div > p > span#cast-overflow > a");
selector!(CREW_HEADERS, "#tab-crew > h3");

// Genres / themes
selector!(GENRE_HEADERS, "#tab-genres > h3");
selector!(THEME_ANCHORS, "p > a:not([href^='/film/'])");

// Details
selector!(DETAIL_HEADERS, "#tab-details > h3");

// Releases
selector!(RELEASE_HEADERS, "#tab-releases > section > h3");
selector!(RELEASE_DATE, "div > h5");
selector!(RELEASE_COUNTRIES, "div > ul > li");
selector!(RELEASE_COUNTRY_NAME, "span > span > span.name");
selector!(RELEASE_AGE_RATING, "span > span > span > span.label");

// Activity
selector!(ACTIVITY_ROWS, "#activity-table-body > section[data-activity-id]");
selector!(ACTIVITY_TIME, "time[datetime]");
selector!(ACTIVITY_CONTEXT, "div > p > a > span.context");
selector!(ACTIVITY_RATING, "div > p > span.rating");
selector!(ACTIVITY_REVIEW_LINK, "div > p > a.target");

// Review
selector!(
    REVIEW_PARAGRAPHS,
    "#content > div > div > section > section > div.review.body-text.-prose.-hero.-loose > div > div > div > p"
);

// Shared
selector!(FIRST_SPAN, "span:first-child");
selector!(PARAGRAPH_ANCHORS, "p > a");
