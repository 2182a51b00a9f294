//! URL helpers for turning scraped hrefs into natural keys.

use url::Url;

/// Resolve a scraped href against the site prefix.
///
/// Absolute hrefs pass through untouched. Returns `None` when the prefix or
/// the href cannot form a valid URL.
#[must_use]
pub fn absolute_url(prefix: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if let Ok(parsed) = Url::parse(href)
        && matches!(parsed.scheme(), "http" | "https")
    {
        return Some(parsed.to_string());
    }

    let base = Url::parse(prefix).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Activity page of one user for one movie, e.g.
/// `https://site/alice/film/heat/activity/`.
#[must_use]
pub fn activity_url(user_url: &str, movie_url: &str) -> Option<String> {
    let user = Url::parse(user_url).ok()?;
    let movie = Url::parse(movie_url).ok()?;

    let user_path = user.path().trim_matches('/');
    let movie_path = movie.path().trim_matches('/');
    if user_path.is_empty() || movie_path.is_empty() {
        return None;
    }

    user.join(&format!("/{user_path}/{movie_path}/activity/"))
        .ok()
        .map(|u| u.to_string())
}

/// Films of a user sorted by watch date, first page.
#[must_use]
pub fn films_by_date_url(user_url: &str) -> Option<String> {
    let user = Url::parse(user_url).ok()?;
    let user_path = user.path().trim_matches('/');
    if user_path.is_empty() {
        return None;
    }
    user.join(&format!("/{user_path}/films/by/date/"))
        .ok()
        .map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://letterboxd.com", "/film/heat-1995/"),
            Some("https://letterboxd.com/film/heat-1995/".to_string())
        );
        assert_eq!(
            absolute_url("https://letterboxd.com", "https://a.ltrbxd.com/x.jpg"),
            Some("https://a.ltrbxd.com/x.jpg".to_string())
        );
        assert_eq!(absolute_url("https://letterboxd.com", "   "), None);
    }

    #[test]
    fn test_activity_url() {
        assert_eq!(
            activity_url(
                "https://letterboxd.com/alice/",
                "https://letterboxd.com/film/heat-1995/"
            ),
            Some("https://letterboxd.com/alice/film/heat-1995/activity/".to_string())
        );
        assert_eq!(activity_url("https://letterboxd.com/", "https://letterboxd.com/film/x/"), None);
    }

    #[test]
    fn test_films_by_date_url() {
        assert_eq!(
            films_by_date_url("https://letterboxd.com/alice/"),
            Some("https://letterboxd.com/alice/films/by/date/".to_string())
        );
    }
}
