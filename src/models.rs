//! Typed records for every table in the store
//!
//! Entity structs carry their surrogate `id`; records built by the
//! extractors hold `0` there until the store assigns the real id.

use serde::Serialize;
use sqlx::FromRow;

use crate::store::{Record, SqlValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub url: String,
    pub name: String,
}

impl User {
    #[must_use]
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            url: url.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub url: String,
    pub name: String,
    /// Runtime in minutes
    pub duration: Option<i64>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub description: Option<String>,
    pub trailer_url: Option<String>,
}

impl Movie {
    #[must_use]
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            url: url.into(),
            name: name.into(),
            duration: None,
            poster_url: None,
            backdrop_url: None,
            description: None,
            trailer_url: None,
        }
    }
}

/// Cast or crew member. The role is the one first seen for this person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Crew {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub role: String,
}

impl Crew {
    #[must_use]
    pub fn new(url: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: 0,
            url: url.into(),
            name: name.into(),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Genre {
    pub id: i64,
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Theme {
    pub id: i64,
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Studio {
    pub id: i64,
    pub url: String,
    pub name: String,
}

macro_rules! named_link {
    ($($ty:ident),+) => {
        $(
            impl $ty {
                #[must_use]
                pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
                    Self {
                        id: 0,
                        url: url.into(),
                        name: name.into(),
                    }
                }
            }
        )+
    };
}

named_link!(Genre, Theme, Studio);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CrewAndMovie {
    pub crew_id: i64,
    pub movie_id: i64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct GenreAndMovie {
    pub genre_id: i64,
    pub movie_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ThemeAndMovie {
    pub theme_id: i64,
    pub movie_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct StudioAndMovie {
    pub studio_id: i64,
    pub movie_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CountryAndMovie {
    pub movie_id: i64,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct LanguageAndMovie {
    pub movie_id: i64,
    pub language: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Release {
    pub movie_id: i64,
    /// Date as displayed on the site, e.g. "14 Feb 2024"
    pub date: String,
    pub country: String,
    pub release_type: String,
    pub age_rating: Option<String>,
}

/// One user's actions on one movie on one date
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WatchActivity {
    pub user_id: i64,
    pub movie_id: i64,
    pub date: String,
    pub is_watched: bool,
    pub is_loved: bool,
    pub rating: Option<f64>,
    pub review: Option<String>,
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn opt_text(s: Option<&String>) -> SqlValue {
    s.map_or(SqlValue::Null, |s| SqlValue::Text(s.clone()))
}

impl Record for User {
    const TABLE: &'static str = "users";
    const KEY: &'static [&'static str] = &["url"];

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("url", text(&self.url)), ("name", text(&self.name))]
    }
}

impl Record for Movie {
    const TABLE: &'static str = "movies";
    const KEY: &'static [&'static str] = &["url"];

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("url", text(&self.url)),
            ("name", text(&self.name)),
            ("duration", self.duration.map_or(SqlValue::Null, SqlValue::Int)),
            ("poster_url", opt_text(self.poster_url.as_ref())),
            ("backdrop_url", opt_text(self.backdrop_url.as_ref())),
            ("description", opt_text(self.description.as_ref())),
            ("trailer_url", opt_text(self.trailer_url.as_ref())),
        ]
    }
}

impl Record for Crew {
    const TABLE: &'static str = "crews";
    const KEY: &'static [&'static str] = &["url"];

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("url", text(&self.url)),
            ("name", text(&self.name)),
            ("role", text(&self.role)),
        ]
    }
}

macro_rules! named_record {
    ($($ty:ident => $table:literal),+) => {
        $(
            impl Record for $ty {
                const TABLE: &'static str = $table;
                const KEY: &'static [&'static str] = &["url"];

                fn columns(&self) -> Vec<(&'static str, SqlValue)> {
                    vec![("url", text(&self.url)), ("name", text(&self.name))]
                }
            }
        )+
    };
}

named_record!(Genre => "genres", Theme => "themes", Studio => "studios");

impl Record for CrewAndMovie {
    const TABLE: &'static str = "crews_and_movies";
    const KEY: &'static [&'static str] = &["crew_id", "movie_id", "role"];

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("crew_id", SqlValue::Int(self.crew_id)),
            ("movie_id", SqlValue::Int(self.movie_id)),
            ("role", text(&self.role)),
        ]
    }
}

macro_rules! join_record {
    ($($ty:ident => $table:literal, $fk:ident);+ $(;)?) => {
        $(
            impl Record for $ty {
                const TABLE: &'static str = $table;
                const KEY: &'static [&'static str] = &[stringify!($fk), "movie_id"];

                fn columns(&self) -> Vec<(&'static str, SqlValue)> {
                    vec![
                        (stringify!($fk), SqlValue::Int(self.$fk)),
                        ("movie_id", SqlValue::Int(self.movie_id)),
                    ]
                }
            }
        )+
    };
}

join_record! {
    GenreAndMovie => "genres_and_movies", genre_id;
    ThemeAndMovie => "themes_and_movies", theme_id;
    StudioAndMovie => "studios_and_movies", studio_id;
}

impl Record for CountryAndMovie {
    const TABLE: &'static str = "countries_and_movies";
    const KEY: &'static [&'static str] = &["movie_id", "country"];

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("movie_id", SqlValue::Int(self.movie_id)),
            ("country", text(&self.country)),
        ]
    }
}

impl Record for LanguageAndMovie {
    const TABLE: &'static str = "languages_and_movies";
    const KEY: &'static [&'static str] = &["movie_id", "language", "is_primary"];

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("movie_id", SqlValue::Int(self.movie_id)),
            ("language", text(&self.language)),
            ("is_primary", SqlValue::Bool(self.is_primary)),
        ]
    }
}

impl Record for Release {
    const TABLE: &'static str = "releases";
    const KEY: &'static [&'static str] =
        &["movie_id", "date", "country", "release_type", "age_rating"];

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("movie_id", SqlValue::Int(self.movie_id)),
            ("date", text(&self.date)),
            ("country", text(&self.country)),
            ("release_type", text(&self.release_type)),
            ("age_rating", opt_text(self.age_rating.as_ref())),
        ]
    }
}

impl Record for WatchActivity {
    const TABLE: &'static str = "users_and_movies";
    const KEY: &'static [&'static str] = &["user_id", "movie_id", "date"];

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("user_id", SqlValue::Int(self.user_id)),
            ("movie_id", SqlValue::Int(self.movie_id)),
            ("date", text(&self.date)),
            ("is_watched", SqlValue::Bool(self.is_watched)),
            ("is_loved", SqlValue::Bool(self.is_loved)),
            ("rating", self.rating.map_or(SqlValue::Null, SqlValue::Real)),
            ("review", opt_text(self.review.as_ref())),
        ]
    }
}
