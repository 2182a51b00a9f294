//! Movie page header: name, runtime, artwork, synopsis and trailer

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use tracing::{debug, warn};

use super::selectors::{
    MOVIE_BACKDROP, MOVIE_DESCRIPTION, MOVIE_FOOTER, MOVIE_NAME, MOVIE_POSTER, MOVIE_TRAILER,
};
use super::{ExtractResult, element_text, require_text};
use crate::models::Movie;

static BACKDROP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://a\.ltrbxd\.com.+jpg").expect("BUG: hardcoded backdrop regex is invalid")
});

/// Runtime in minutes from the footer text, e.g. `"121\u{a0}mins  More at IMDb"`.
#[must_use]
pub fn parse_duration(footer: &str) -> Option<i64> {
    footer
        .trim()
        .split('\u{a0}')
        .next()
        .and_then(|head| head.trim().parse::<i64>().ok())
}

/// Movie record for the page at `url`. The id is left at 0.
///
/// # Errors
///
/// Only a missing movie name is fatal.
pub fn extract_movie(doc: &Html, url: &str, prefix: &str) -> ExtractResult<Movie> {
    let name = require_text(
        doc.select(&MOVIE_NAME)
            .next()
            .map(element_text)
            .unwrap_or_default(),
        "movie",
        "name",
    )?;
    let mut movie = Movie::new(url, name);
    debug!(url, name = %movie.name, "movie name extracted");

    let footer = doc
        .select(&MOVIE_FOOTER)
        .next()
        .map(|p| p.text().collect::<String>())
        .unwrap_or_default();
    movie.duration = parse_duration(&footer);
    match movie.duration {
        Some(minutes) => debug!(url, minutes, "movie duration extracted"),
        None => warn!(url, footer = %footer.trim(), "unable to locate movie duration"),
    }

    movie.poster_url = doc
        .select(&MOVIE_POSTER)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);
    if movie.poster_url.is_none() {
        warn!(url, "movie does not have poster");
    }

    movie.backdrop_url = doc
        .select(&MOVIE_BACKDROP)
        .next()
        .and_then(|el| el.value().attr("style"))
        .and_then(|style| BACKDROP_URL.find(style))
        .map(|m| m.as_str().to_string());
    if movie.backdrop_url.is_none() {
        warn!(url, "movie does not have backdrop");
    }

    movie.description = doc
        .select(&MOVIE_DESCRIPTION)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    if movie.description.is_none() {
        debug!(url, "movie has no description");
    }

    movie.trailer_url = doc
        .select(&MOVIE_TRAILER)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| crate::utils::absolute_url(prefix, href));
    if movie.trailer_url.is_none() {
        debug!(url, "movie has no trailer");
    }

    Ok(movie)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::ExtractError;

    const PREFIX: &str = "https://letterboxd.com";
    const URL: &str = "https://letterboxd.com/film/heat-1995/";

    fn movie_page(name: &str, footer: &str, extra: &str) -> Html {
        Html::parse_document(&format!(
            r#"<html><head><meta property="og:description" content=" A group of thieves. "></head><body>
            <div id="film-page-wrapper"><div class="col-17">
              <section class="production-masthead -shadowed -productionscreen -film"><div><h1><span>{name}</span></h1></div></section>
              <section class="section col-10 col-main"><p class="text-link">{footer}</p></section>
            </div></div>
            {extra}
            </body></html>"#
        ))
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("170\u{a0}mins \u{a0} More at IMDb"), Some(170));
        assert_eq!(parse_duration("  More at IMDb TMDb"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_extract_movie_full() {
        let extra = r#"
            <div id="js-poster-col"><section class="poster-list -p230 -single no-hover el col">
              <div class="react-component"><div><img src="https://a.ltrbxd.com/poster.jpg"></div></div>
            </section></div>
            <div id="backdrop"><div class="backdropimage js-backdrop-image"
                 style="background-image: url(https://a.ltrbxd.com/resized/sm/upload/heat.jpg?v=1)"></div></div>
            <p class="trailer-link"><a class="play" href="//www.youtube.com/embed/abc">Trailer</a></p>"#;
        let doc = movie_page("Heat", "170&nbsp;mins &nbsp; More at IMDb", extra);
        let movie = extract_movie(&doc, URL, PREFIX).expect("movie");

        assert_eq!(movie.name, "Heat");
        assert_eq!(movie.url, URL);
        assert_eq!(movie.duration, Some(170));
        assert_eq!(movie.poster_url.as_deref(), Some("https://a.ltrbxd.com/poster.jpg"));
        assert_eq!(
            movie.backdrop_url.as_deref(),
            Some("https://a.ltrbxd.com/resized/sm/upload/heat.jpg")
        );
        assert_eq!(movie.description.as_deref(), Some("A group of thieves."));
        assert_eq!(
            movie.trailer_url.as_deref(),
            Some("https://www.youtube.com/embed/abc")
        );
    }

    #[test]
    fn test_duration_absent_is_not_fatal() {
        let doc = movie_page("Heat", "More at IMDb TMDb", "");
        let movie = extract_movie(&doc, URL, PREFIX).expect("movie");
        assert_eq!(movie.duration, None);
        assert_eq!(movie.poster_url, None);
        assert_eq!(movie.backdrop_url, None);
        assert_eq!(movie.trailer_url, None);
    }

    #[test]
    fn test_missing_name_is_fatal() {
        let doc = movie_page("   ", "170&nbsp;mins", "");
        assert_eq!(
            extract_movie(&doc, URL, PREFIX),
            Err(ExtractError::MissingField {
                entity: "movie",
                field: "name"
            })
        );
    }
}
