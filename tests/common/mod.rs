//! Test utilities: an in-memory browser and page fixtures for the crawler

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;

use cinecrawl::browser::{BrowserError, BrowserResult, BrowserSession, BrowserTab, NavigationResponse, NetworkEvent};

pub const PREFIX: &str = "https://letterboxd.com";

const BLANK: &str = "<html><head></head><body></body></html>";
const POLL: Duration = Duration::from_millis(10);

/// One scripted page of the fake site
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    html: String,
    /// Statuses returned by successive navigations; 200 once drained
    statuses: VecDeque<u16>,
    visible: HashSet<String>,
    present: HashSet<String>,
    /// `click_and_wait` selector -> destination url
    links: HashMap<String, String>,
    /// `click` selector -> html the page shows afterwards
    reveals: HashMap<String, String>,
    /// Rendered text per selector
    texts: HashMap<String, String>,
    latency: Duration,
    transport_error: bool,
}

impl FakePage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn visible(mut self, selector: &str) -> Self {
        self.visible.insert(selector.to_string());
        self
    }

    pub fn present(mut self, selector: &str) -> Self {
        self.present.insert(selector.to_string());
        self
    }

    pub fn statuses(mut self, statuses: &[u16]) -> Self {
        self.statuses = statuses.iter().copied().collect();
        self
    }

    pub fn link(mut self, selector: &str, url: &str) -> Self {
        self.links.insert(selector.to_string(), url.to_string());
        self
    }

    pub fn reveal(mut self, selector: &str, html: impl Into<String>) -> Self {
        self.reveals.insert(selector.to_string(), html.into());
        self
    }

    pub fn text(mut self, selector: &str, text: &str) -> Self {
        self.texts.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn transport_error(mut self) -> Self {
        self.transport_error = true;
        self
    }
}

/// Browser operations observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Navigate(String),
    Click(String),
    ClickAndWait(String),
    Close(usize),
}

#[derive(Default)]
struct SiteState {
    pages: HashMap<String, FakePage>,
    calls: Vec<Call>,
    opened: usize,
    closed: usize,
    injected: Vec<usize>,
}

/// Scripted site shared by every tab of a [`FakeSession`]
#[derive(Clone, Default)]
pub struct FakeSite {
    state: Arc<Mutex<SiteState>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, page: FakePage) -> &Self {
        self.lock().pages.insert(url.to_string(), page);
        self
    }

    pub fn session(&self) -> Arc<FakeSession> {
        Arc::new(FakeSession {
            site: self.clone(),
            next_id: AtomicUsize::new(1),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn navigation_count(&self, url: &str) -> usize {
        self.navigations().iter().filter(|u| *u == url).count()
    }

    pub fn tabs_opened(&self) -> usize {
        self.lock().opened
    }

    pub fn tabs_closed(&self) -> usize {
        self.lock().closed
    }

    /// Ids of tabs that registered the DOM helper script
    pub fn injected(&self) -> Vec<usize> {
        self.lock().injected.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SiteState> {
        self.state.lock().expect("fake site poisoned")
    }
}

pub struct FakeSession {
    site: FakeSite,
    next_id: AtomicUsize,
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Tab = FakeTab;

    async fn new_tab(&self) -> BrowserResult<FakeTab> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.site.lock().opened += 1;
        Ok(FakeTab {
            id,
            site: self.site.clone(),
            current: Mutex::new(None),
            shown: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    async fn shutdown(&self) -> BrowserResult<()> {
        Ok(())
    }
}

pub struct FakeTab {
    pub id: usize,
    site: FakeSite,
    current: Mutex<Option<String>>,
    /// Html replaced by a click, until the next navigation
    shown: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl FakeTab {
    fn current_url(&self) -> Option<String> {
        self.current.lock().expect("tab poisoned").clone()
    }

    fn with_page<R>(&self, f: impl FnOnce(Option<&FakePage>) -> R) -> R {
        let url = self.current_url();
        let state = self.site.lock();
        f(url.as_ref().and_then(|u| state.pages.get(u)))
    }

    fn ensure_open(&self) -> BrowserResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    fn record(&self, call: Call) {
        self.site.lock().calls.push(call);
    }
}

#[async_trait]
impl BrowserTab for FakeTab {
    async fn navigate(&self, url: &str) -> BrowserResult<NavigationResponse> {
        self.ensure_open()?;
        self.record(Call::Navigate(url.to_string()));

        let scripted = {
            let mut state = self.site.lock();
            state
                .pages
                .get_mut(url)
                .map(|p| (p.statuses.pop_front().unwrap_or(200), p.latency, p.transport_error))
        };

        let status = match scripted {
            Some((_, _, true)) => {
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    message: "net::ERR_CONNECTION_RESET".to_string(),
                });
            }
            Some((status, latency, false)) => {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                status
            }
            None => 404,
        };

        *self.current.lock().expect("tab poisoned") = Some(url.to_string());
        *self.shown.lock().expect("tab poisoned") = None;
        Ok(NavigationResponse::with_status(status))
    }

    async fn click(&self, selector: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        self.record(Call::Click(selector.to_string()));
        let revealed = self.with_page(|p| p.and_then(|p| p.reveals.get(selector).cloned()));
        match revealed {
            Some(html) => {
                *self.shown.lock().expect("tab poisoned") = Some(html);
                Ok(())
            }
            None => Err(BrowserError::ElementNotFound(selector.to_string())),
        }
    }

    async fn click_and_wait(&self, selector: &str) -> BrowserResult<NavigationResponse> {
        self.ensure_open()?;
        self.record(Call::ClickAndWait(selector.to_string()));
        let target = self.with_page(|p| p.and_then(|p| p.links.get(selector).cloned()));
        match target {
            Some(url) => self.navigate(&url).await,
            None => Err(BrowserError::ElementNotFound(selector.to_string())),
        }
    }

    async fn wait_visible(&self, selector: &str) -> BrowserResult<()> {
        loop {
            self.ensure_open()?;
            if self.with_page(|p| p.is_some_and(|p| p.visible.contains(selector))) {
                return Ok(());
            }
            tokio::time::sleep(POLL).await;
        }
    }

    async fn evaluate(&self, script: &str) -> BrowserResult<serde_json::Value> {
        self.ensure_open()?;
        let found = self.with_page(|p| {
            p.is_some_and(|p| {
                p.present.iter().chain(&p.visible).any(|selector| {
                    serde_json::to_string(selector).is_ok_and(|literal| script.contains(&literal))
                })
            })
        });
        Ok(serde_json::Value::Bool(found))
    }

    async fn outer_html(&self, _selector: &str) -> BrowserResult<String> {
        self.ensure_open()?;
        if let Some(html) = self.shown.lock().expect("tab poisoned").clone() {
            return Ok(html);
        }
        Ok(self.with_page(|p| p.map_or_else(|| BLANK.to_string(), |p| p.html.clone())))
    }

    async fn text(&self, selector: &str) -> BrowserResult<String> {
        self.ensure_open()?;
        self.with_page(|p| p.and_then(|p| p.texts.get(selector).cloned()))
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }

    async fn inject_script_on_new_document(&self, script: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        assert!(script.contains("__cinecrawl"), "unexpected script injected");
        self.site.lock().injected.push(self.id);
        Ok(())
    }

    async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        self.ensure_open()?;
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn network_events(&self) -> BrowserResult<BoxStream<'static, NetworkEvent>> {
        let events = self.current_url().map(|url| NetworkEvent::Request {
            url,
            method: "GET".to_string(),
        });
        Ok(futures::stream::iter(events).boxed())
    }

    async fn close(&self) -> BrowserResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(BrowserError::Closed);
        }
        let mut state = self.site.lock();
        state.closed += 1;
        state.calls.push(Call::Close(self.id));
        Ok(())
    }
}

// Page fixtures, shaped like the real site's markup

pub fn members_page(users: &[(&str, &str)]) -> String {
    let rows: String = users
        .iter()
        .map(|(slug, name)| {
            format!(r#"<tr><td><div><h3><a href="/{slug}/">{name}</a></h3></div></td></tr>"#)
        })
        .collect();
    format!(
        r#"<html><body><div id="content"><div><div><section><table><tbody>{rows}</tbody></table></section></div></div></div></body></html>"#
    )
}

pub fn films_page(film_slugs: &[&str], last_page: Option<u32>) -> String {
    let items: String = film_slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<li><div><div><a href="/film/{slug}/"><span class="overlay"></span></a></div></div></li>"#
            )
        })
        .collect();
    let pagination = last_page
        .map(|last| {
            format!(
                r#"<div class="pagination"><div class="paginate-newer"></div><div class="paginate-older"><a href="?next">Older</a></div>
                   <div class="paginate-pages"><ul><li><a href="?p=1">1</a></li><li><a href="?p={last}">{last}</a></li></ul></div></div>"#
            )
        })
        .unwrap_or_default();
    format!(
        r#"<html><body><div id="content"><div><div><section>
            <div class="poster-grid"><ul>{items}</ul></div>{pagination}
        </section></div></div></div></body></html>"#
    )
}

pub fn movie_page(name: &str) -> String {
    format!(
        r#"<html><head><meta property="og:description" content="A group of thieves."></head><body>
        <div id="film-page-wrapper"><div class="col-17">
          <section class="production-masthead -shadowed -productionscreen -film"><div><h1><span>{name}</span></h1></div></section>
          <section class="section col-10 col-main"><p class="text-link">170&nbsp;mins &nbsp; More at IMDb</p></section>
        </div></div>
        <div id="tab-cast"><div><p>
          <a href="/actor/al-pacino/">Al Pacino</a>
          <a href="/actor/robert-de-niro/">Robert De Niro</a>
        </p></div></div>
        <div id="tab-crew">
          <h3><span>Director</span></h3>
          <div class="text-sluglist"><p><a href="/director/michael-mann/">Michael Mann</a></p></div>
          <h3><span>Writer</span></h3>
          <div class="text-sluglist"><p><a href="/writer/michael-mann/">Michael Mann</a></p></div>
        </div>
        <div id="tab-details">
          <h3><span>Studio</span></h3>
          <div class="text-sluglist"><p><a href="/studio/warner-bros-pictures/">Warner Bros. Pictures</a></p></div>
          <h3><span>Country</span></h3>
          <div class="text-sluglist"><p><a href="/films/country/usa/">USA</a></p></div>
          <h3><span>Language</span></h3>
          <div class="text-sluglist"><p><a href="/films/language/english/">English</a></p></div>
        </div>
        <div id="tab-genres">
          <h3><span>Genres</span></h3>
          <div class="text-sluglist"><p><a href="/films/genre/crime/">Crime</a></p></div>
          <h3><span>Themes</span></h3>
          <div class="text-sluglist"><p><a href="/films/theme/heists/">Heists</a></p></div>
        </div>
        <div id="tab-releases">
          <section><h3>Theatrical</h3><div class="release-table">
            <div class="listitem"><div class="cell"><h5 class="date">15 Dec 1995</h5></div>
              <div class="cell"><ul><li><span class="country"><span class="flag"><span class="name">USA</span></span></span></li></ul></div></div>
          </div></section>
        </div>
        </body></html>"#
    )
}

/// One activity row: `(datetime, action phrase, extra markup)`
pub fn activity_page(user_slug: &str, rows: &[(&str, &str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .enumerate()
        .map(|(i, (date, context, extra))| {
            format!(
                r#"<section class="activity-row" data-activity-id="{i}"><div><p>
                    <a href="/{user_slug}/"><strong>{user_slug}</strong><span class="context"> {context} </span></a>
                    {extra}
                </p></div><span class="nobr"><time datetime="{date}">date</time></span></section>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="activity-table-body">{rows}<section class="activity-row no-activity-message"><p>End</p></section></div></body></html>"#
    )
}

pub fn review_page(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        r#"<html><body><div id="content"><div><div><section><section>
            <div class="review body-text -prose -hero -loose"><div><div><div>{body}</div></div></div></div>
        </section></section></div></div></div></body></html>"#
    )
}
