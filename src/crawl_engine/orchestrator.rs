//! Main crawl orchestration logic
//!
//! Walks the site strictly sequentially:
//! - popular members pages, in order
//! - each member's films by watch date, page by page
//! - for every film: the movie page (skipped when already stored), then the
//!   member's activity page for that film, then any review pages it links
//!
//! Listing pages share one tab; every movie, activity and review page gets
//! its own tab from the tab manager.

use std::sync::Arc;

use log::{debug, info, warn};
use scraper::Html;
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlError, CrawlResult, CrawlSummary, Jitter, Transition, Trigger, UnitKind};
use super::executor::PageExecutor;
use super::screenshot::capture_failure;
use super::tabs::{TabGuard, TabManager};
use crate::browser::{BrowserSession, BrowserTab, element_exists};
use crate::config::{CrawlerConfig, FailurePolicy};
use crate::extractors::{self, ActivityDraft, ExtractResult, selectors};
use crate::models::{
    CountryAndMovie, Crew, CrewAndMovie, Genre, GenreAndMovie, LanguageAndMovie, Movie, Release,
    Studio, StudioAndMovie, Theme, ThemeAndMovie, User, WatchActivity,
};
use crate::store::Store;
use crate::utils::{MEMBERS_PAGE_PATH, activity_url, films_by_date_url, safe_truncate_chars};

const SETTLE_LONG: Jitter = Jitter::millis(2000, 300);
const SETTLE_SHORT: Jitter = Jitter::millis(1000, 300);

/// Everything extracted from one movie page. Association rows carry a
/// placeholder movie id until the movie itself has been stored.
#[derive(Debug)]
struct ScrapedMovie {
    movie: Movie,
    cast: Vec<Crew>,
    crew: Vec<Crew>,
    genres: Vec<Genre>,
    themes: Vec<Theme>,
    studios: Vec<Studio>,
    countries: Vec<CountryAndMovie>,
    languages: Vec<LanguageAndMovie>,
    releases: Vec<Release>,
}

fn parse_movie_page(html: &str, url: &str, prefix: &str) -> ExtractResult<ScrapedMovie> {
    let doc = Html::parse_document(html);
    let (genres, themes) = extractors::extract_genres_and_themes(&doc, prefix)?;
    Ok(ScrapedMovie {
        movie: extractors::extract_movie(&doc, url, prefix)?,
        cast: extractors::extract_cast(&doc, prefix)?,
        crew: extractors::extract_crew(&doc, prefix)?,
        genres,
        themes,
        studios: extractors::extract_studios(&doc, prefix)?,
        countries: extractors::extract_countries(&doc, 0)?,
        languages: extractors::extract_languages(&doc, 0)?,
        releases: extractors::extract_releases(&doc, 0)?,
    })
}

/// Sequential crawler over one browser session and one store
pub struct Crawler<S: BrowserSession> {
    config: CrawlerConfig,
    store: Store,
    tabs: TabManager<S>,
    executor: PageExecutor,
    summary: CrawlSummary,
}

impl<S: BrowserSession> Crawler<S> {
    #[must_use]
    pub fn new(config: CrawlerConfig, store: Store, session: Arc<S>, cancel: CancellationToken) -> Self {
        let executor = PageExecutor::from_config(&config, cancel);
        Self {
            config,
            store,
            tabs: TabManager::new(session),
            executor,
            summary: CrawlSummary::default(),
        }
    }

    /// Crawl `max_pages` members pages and everything reachable from them.
    ///
    /// # Errors
    ///
    /// Under `FailurePolicy::AbortRun`, the first error. Under `SkipUnit`,
    /// only cancellation, configuration and store errors.
    pub async fn run(mut self) -> CrawlResult<CrawlSummary> {
        info!(
            "Starting crawl: {} members page(s), failure policy {:?}",
            self.config.max_pages(),
            self.config.failure_policy()
        );

        let listing = self.tabs.open("listing").await?;
        let result = self.crawl_members_pages(&listing).await;
        listing.release().await;
        result?;

        info!(
            "Crawl finished: {} users, {} movies scraped, {} skipped, {} activities, {} failed units",
            self.summary.users,
            self.summary.movies_scraped,
            self.summary.movies_skipped,
            self.summary.activities,
            self.summary.failed.len()
        );
        Ok(self.summary)
    }

    async fn crawl_members_pages(&mut self, listing: &TabGuard<S::Tab>) -> CrawlResult<()> {
        for page in 1..=self.config.max_pages() {
            let url = format!("{}{}/{}/", self.config.site_prefix(), MEMBERS_PAGE_PATH, page);

            let users = match self.fetch_members_page(listing, &url).await {
                Ok(users) => users,
                Err(e) => {
                    self.handle_failure(UnitKind::MembersPage, &url, e)?;
                    continue;
                }
            };
            self.summary.members_pages += 1;
            info!("Members page {page}: {} users", users.len());

            for user in users {
                let user = self.store.insert_or_get(&user).await?;
                self.summary.users += 1;

                if let Err(e) = self.crawl_user(listing, &user).await {
                    self.handle_failure(UnitKind::User, &user.url, e)?;
                }
            }
        }
        Ok(())
    }

    async fn fetch_members_page(&self, listing: &TabGuard<S::Tab>, url: &str) -> CrawlResult<Vec<User>> {
        let html = self
            .executor
            .fetch(
                listing.tab(),
                Transition::Navigate(url.to_string()),
                vec![
                    Trigger::wait_visible(selectors::MEMBERS_LAST_ROW),
                    Trigger::delay(SETTLE_LONG),
                ],
            )
            .await?;
        let doc = Html::parse_document(&html);
        Ok(extractors::extract_users(&doc, self.config.site_prefix())?)
    }

    /// Walk one member's films, page by page via the "next" button.
    async fn crawl_user(&mut self, listing: &TabGuard<S::Tab>, user: &User) -> CrawlResult<()> {
        let films_url = films_by_date_url(&user.url).ok_or_else(|| {
            CrawlError::Config(format!("cannot build films url for {}", user.url))
        })?;
        info!("Crawling user {} ({})", user.name, user.url);

        // Until the paginator shows the new number, the old grid still
        // satisfies the poster wait.
        let triggers = |page: u32| {
            let mut triggers = Vec::with_capacity(3);
            if page > 1 {
                triggers.push(Trigger::wait_text(selectors::FILMS_CURRENT_PAGE, page.to_string()));
            }
            triggers.push(Trigger::wait_visible(selectors::FILMS_LAST_POSTER));
            triggers.push(Trigger::delay(SETTLE_LONG));
            triggers
        };

        let mut page: u32 = 1;
        let mut transition = Transition::Navigate(films_url);
        loop {
            let html = self
                .executor
                .fetch(listing.tab(), transition, triggers(page))
                .await?;
            let (film_urls, last_page) = {
                let doc = Html::parse_document(&html);
                let urls = extractors::extract_film_urls(&doc, self.config.site_prefix())?;
                (urls, extractors::extract_last_page(&doc))
            };

            let last_page = last_page.unwrap_or_else(|| {
                debug!("No pagination for {}, single page", user.url);
                1
            });
            debug!("User {} films page {page}/{last_page}: {} films", user.url, film_urls.len());

            for movie_url in film_urls {
                if let Err(e) = self.crawl_film(user, &movie_url).await {
                    self.handle_failure(UnitKind::Movie, &movie_url, e)?;
                }
            }

            if page >= last_page {
                break;
            }
            page += 1;
            transition = Transition::Click(selectors::FILMS_NEXT_BUTTON.to_string());
        }

        Ok(())
    }

    async fn crawl_film(&mut self, user: &User, movie_url: &str) -> CrawlResult<()> {
        let movie = self.scrape_movie(movie_url).await?;
        self.scrape_activities(user, &movie).await
    }

    /// Stored movie for `url`, scraping and persisting it on first sight.
    async fn scrape_movie(&mut self, url: &str) -> CrawlResult<Movie> {
        if let Some(movie) = self.store.find_by_url::<Movie>(url).await? {
            warn!("Movie already in db, skipping: {url}");
            self.summary.movies_skipped += 1;
            return Ok(movie);
        }

        let guard = self.tabs.open("movie").await?;
        let scraped = self.fetch_movie_page(guard.tab(), url).await;
        if let Err(e) = &scraped {
            self.capture(guard.tab(), url, e).await;
        }
        guard.release().await;

        let movie = self.persist_movie(scraped?).await?;
        self.summary.movies_scraped += 1;
        Ok(movie)
    }

    async fn fetch_movie_page(&self, tab: &Arc<S::Tab>, url: &str) -> CrawlResult<ScrapedMovie> {
        let html = self
            .executor
            .fetch(
                tab,
                Transition::Navigate(url.to_string()),
                vec![
                    Trigger::delay(SETTLE_LONG),
                    Trigger::WaitVisibleIf {
                        probe: selectors::MOVIE_BACKDROP_PROBE.to_string(),
                        selectors: vec![
                            selectors::MOVIE_BACKDROP_LOADED.to_string(),
                            selectors::MOVIE_POSTER_LOADED.to_string(),
                        ],
                    },
                    Trigger::delay(SETTLE_SHORT),
                ],
            )
            .await?;
        Ok(parse_movie_page(&html, url, self.config.site_prefix())?)
    }

    /// Persist a movie and everything attached to it, parents before joins.
    async fn persist_movie(&self, scraped: ScrapedMovie) -> CrawlResult<Movie> {
        let store = &self.store;
        let movie = store.insert_or_get(&scraped.movie).await?;
        let movie_id = movie.id;

        for person in scraped.cast.iter().chain(&scraped.crew) {
            let stored = store.insert_or_get(person).await?;
            store
                .insert_or_get(&CrewAndMovie {
                    crew_id: stored.id,
                    movie_id,
                    role: person.role.clone(),
                })
                .await?;
        }

        for genre in &scraped.genres {
            let genre_id = store.insert_or_get(genre).await?.id;
            store.insert_or_get(&GenreAndMovie { genre_id, movie_id }).await?;
        }

        for theme in &scraped.themes {
            let theme_id = store.insert_or_get(theme).await?.id;
            store.insert_or_get(&ThemeAndMovie { theme_id, movie_id }).await?;
        }

        for studio in &scraped.studios {
            let studio_id = store.insert_or_get(studio).await?.id;
            store.insert_or_get(&StudioAndMovie { studio_id, movie_id }).await?;
        }

        for country in scraped.countries {
            store
                .insert_or_get(&CountryAndMovie { movie_id, ..country })
                .await?;
        }

        for language in scraped.languages {
            store
                .insert_or_get(&LanguageAndMovie { movie_id, ..language })
                .await?;
        }

        for release in scraped.releases {
            store.insert_or_get(&Release { movie_id, ..release }).await?;
        }

        info!("Movie stored: {} ({})", movie.name, movie.url);
        Ok(movie)
    }

    async fn scrape_activities(&mut self, user: &User, movie: &Movie) -> CrawlResult<()> {
        let url = activity_url(&user.url, &movie.url).ok_or_else(|| {
            CrawlError::Config(format!("cannot build activity url for {} / {}", user.url, movie.url))
        })?;

        let guard = self.tabs.open("activity").await?;
        let drafts = self.fetch_activity_page(guard.tab(), &url).await;
        if let Err(e) = &drafts {
            self.capture(guard.tab(), &url, e).await;
        }
        guard.release().await;

        for draft in drafts? {
            let review = match &draft.review_url {
                Some(review_url) => self.scrape_review(review_url).await?,
                None => None,
            };

            self.store
                .insert_or_get(&WatchActivity {
                    user_id: user.id,
                    movie_id: movie.id,
                    date: draft.date,
                    is_watched: draft.is_watched,
                    is_loved: draft.is_loved,
                    rating: draft.rating,
                    review,
                })
                .await?;
            self.summary.activities += 1;
        }

        Ok(())
    }

    async fn fetch_activity_page(&self, tab: &Arc<S::Tab>, url: &str) -> CrawlResult<Vec<ActivityDraft>> {
        let html = self
            .executor
            .fetch(
                tab,
                Transition::Navigate(url.to_string()),
                vec![
                    Trigger::delay(SETTLE_LONG),
                    Trigger::wait_visible(selectors::ACTIVITY_TABLE_END),
                    Trigger::delay(SETTLE_SHORT),
                ],
            )
            .await?;
        let doc = Html::parse_document(&html);
        Ok(extractors::extract_activities(&doc, self.config.site_prefix()))
    }

    /// Review text behind `url`, revealing spoiler-guarded reviews first.
    async fn scrape_review(&self, url: &str) -> CrawlResult<Option<String>> {
        let guard = self.tabs.open("review").await?;
        let review = self.fetch_review_page(guard.tab(), url).await;
        if let Err(e) = &review {
            self.capture(guard.tab(), url, e).await;
        }
        guard.release().await;
        review
    }

    async fn fetch_review_page(&self, tab: &Arc<S::Tab>, url: &str) -> CrawlResult<Option<String>> {
        self.executor
            .transition(
                tab,
                Transition::Navigate(url.to_string()),
                vec![
                    Trigger::delay(SETTLE_LONG),
                    Trigger::wait_visible(selectors::REVIEW_POSTER),
                    Trigger::delay(SETTLE_SHORT),
                ],
            )
            .await?;

        if element_exists(tab.as_ref(), selectors::REVIEW_SPOILER_BUTTON).await? {
            debug!("Revealing spoiler-guarded review: {url}");
            tab.click(selectors::REVIEW_SPOILER_BUTTON).await?;
        }

        let html = tab.outer_html("html").await?;
        let review = extractors::extract_review(&Html::parse_document(&html));
        match &review {
            Some(text) => debug!("Review {url}: {}", safe_truncate_chars(text, 80)),
            None => warn!("Review page without text: {url}"),
        }
        Ok(review)
    }

    async fn capture(&self, tab: &Arc<S::Tab>, label: &str, error: &CrawlError) {
        if error.is_cancelled() {
            return;
        }
        if let Some(dir) = self.config.screenshot_dir() {
            capture_failure(tab.as_ref(), dir, label).await;
        }
    }

    /// Apply the failure policy to a failed unit.
    fn handle_failure(&mut self, kind: UnitKind, url: &str, error: CrawlError) -> CrawlResult<()> {
        if self.config.failure_policy() == FailurePolicy::SkipUnit && !error.is_fatal() {
            warn!("Skipping {kind} {url}: {error}");
            self.summary.record_failure(kind, url, &error);
            Ok(())
        } else {
            Err(error)
        }
    }
}
