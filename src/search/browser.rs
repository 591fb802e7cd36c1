// src/search/browser.rs
//! Browser-driven scraper. Owns one Chrome session for the length of a search.
//!
//! `headless_chrome` is blocking, so every call into it goes through
//! `spawn_blocking`. Pacing sleeps stay on the async side so a dropped search
//! stops at the next await and tears the session down.

use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::filters::browser_search_url;
use super::SearchStrategy;
use crate::types::{JobListing, JobSource, SearchRequest};

/// Wait after each scroll for more cards to render
pub const SCROLL_PAUSE: Duration = Duration::from_secs(2);
/// Upper bound on scroll passes per search
pub const MAX_SCROLL_ATTEMPTS: usize = 15;
/// Wait between two job detail fetches
pub const DETAIL_FETCH_DELAY: Duration = Duration::from_secs(2);

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const WINDOW_SIZE: (u32, u32) = (1920, 1080);

const RESULTS_SELECTOR: &str = "div.jobs-search__results-list";
const CARD_SELECTOR: &str = "div.base-card.base-search-card.job-search-card";
const CARD_TITLE_SELECTOR: &str = "h3.base-search-card__title";
const CARD_LINK_SELECTORS: [&str; 2] = ["a.base-card__full-link", "h3.base-search-card__title a"];
const CARD_COMPANY_SELECTOR: &str = "h4.base-search-card__subtitle";
const CARD_LOCATION_SELECTOR: &str = "span.job-search-card__location";
const CARD_DATE_SELECTOR: &str = "time.job-search-card__listdate";
const DESCRIPTION_SELECTOR: &str = "div.show-more-less-html__markup";
const FALLBACK_DESCRIPTION_SELECTOR: &str = "div.description__text";

const DESCRIPTION_UNAVAILABLE: &str = "Description not available";

const MASK_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub user_agent: String,
    pub timeout: Duration,
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            chrome_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScraperState {
    Uninitialized,
    Initialized,
    Searching,
    Closed,
}

struct BrowserSession {
    browser: Arc<Browser>,
    tab: Arc<Tab>,
}

/// Auxiliary tab, closed on drop whatever happened while it was open
struct AuxTab(Arc<Tab>);

impl AuxTab {
    fn open(browser: &Browser) -> Result<Self> {
        let tab = browser.new_tab().context("Failed to open auxiliary tab")?;
        Ok(Self(tab))
    }
}

impl Drop for AuxTab {
    fn drop(&mut self) {
        if let Err(e) = self.0.close(false) {
            warn!("Failed to close auxiliary tab: {}", e);
        }
    }
}

/// Data read off one result card before its detail page is visited
#[derive(Debug, Clone)]
struct CardSummary {
    title: String,
    company: String,
    location: String,
    job_url: String,
    posted_date: Option<String>,
}

async fn on_tab<T, F>(tab: &Arc<Tab>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Tab) -> Result<T> + Send + 'static,
{
    let tab = Arc::clone(tab);
    tokio::task::spawn_blocking(move || f(&tab))
        .await
        .context("Browser task panicked")?
}

fn launch(config: &BrowserConfig) -> Result<BrowserSession> {
    let user_agent_arg = format!("--user-agent={}", config.user_agent);
    let args: Vec<&OsStr> = vec![
        OsStr::new("--disable-blink-features=AutomationControlled"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new("--disable-gpu"),
        OsStr::new(user_agent_arg.as_str()),
    ];

    let options = LaunchOptions::default_builder()
        .headless(config.headless)
        .sandbox(false)
        .window_size(Some(WINDOW_SIZE))
        .path(config.chrome_path.clone())
        .args(args)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid browser launch options: {}", e))?;

    let browser = Browser::new(options).context("Failed to launch browser")?;
    let tab = browser.new_tab().context("Failed to open browser tab")?;
    tab.set_default_timeout(config.timeout);
    tab.set_user_agent(&config.user_agent, Some("en-US,en"), None)
        .context("Failed to set user agent")?;

    Ok(BrowserSession {
        browser: Arc::new(browser),
        tab,
    })
}

fn inner_text(element: &Element<'_>, selector: &str) -> Result<String> {
    let text = element
        .find_element(selector)
        .with_context(|| format!("Missing {}", selector))?
        .get_inner_text()?;
    Ok(text.trim().to_string())
}

fn read_card(card: &Element<'_>) -> Result<CardSummary> {
    let title = inner_text(card, CARD_TITLE_SELECTOR)?;
    let company = inner_text(card, CARD_COMPANY_SELECTOR)?;
    let location = inner_text(card, CARD_LOCATION_SELECTOR)?;

    let job_url = CARD_LINK_SELECTORS
        .iter()
        .find_map(|selector| card.find_element(selector).ok())
        .and_then(|link| link.get_attribute_value("href").ok().flatten())
        .context("Card has no job link")?;

    let posted_date = card.find_element(CARD_DATE_SELECTOR).ok().and_then(|time| {
        time.get_attribute_value("datetime")
            .ok()
            .flatten()
            .or_else(|| time.get_inner_text().ok().map(|t| t.trim().to_string()))
    });

    Ok(CardSummary {
        title,
        company,
        location,
        job_url,
        posted_date,
    })
}

fn read_cards(tab: &Tab, limit: usize) -> Vec<CardSummary> {
    let cards = match tab.find_elements(CARD_SELECTOR) {
        Ok(cards) => cards,
        Err(e) => {
            warn!("No job cards found: {}", e);
            return Vec::new();
        }
    };

    cards
        .iter()
        .take(limit)
        .filter_map(|card| match read_card(card) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Error extracting job card: {:#}", e);
                None
            }
        })
        .collect()
}

fn read_description(browser: &Browser, primary: &Tab, job_url: &str, timeout: Duration) -> String {
    let result = (|| -> Result<String> {
        let aux = AuxTab::open(browser)?;
        aux.0.navigate_to(job_url)?;

        let text = match aux
            .0
            .wait_for_element_with_custom_timeout(DESCRIPTION_SELECTOR, timeout)
        {
            Ok(element) => element.get_inner_text()?,
            Err(_) => match aux.0.find_element(FALLBACK_DESCRIPTION_SELECTOR) {
                Ok(element) => element.get_inner_text()?,
                Err(_) => DESCRIPTION_UNAVAILABLE.to_string(),
            },
        };
        Ok(text.trim().to_string())
    })();

    if let Err(e) = primary.activate() {
        warn!("Failed to refocus primary tab: {}", e);
    }

    result.unwrap_or_else(|e| {
        warn!("Error getting job description for {}: {:#}", job_url, e);
        DESCRIPTION_UNAVAILABLE.to_string()
    })
}

fn scroll_height(tab: &Tab) -> Result<u64> {
    let value = tab
        .evaluate("document.body.scrollHeight", false)?
        .value
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    Ok(value as u64)
}

/// Chrome binary the scraper would launch, if one can be found
pub fn chrome_executable(config: &BrowserConfig) -> Option<PathBuf> {
    match &config.chrome_path {
        Some(path) => path.exists().then(|| path.clone()),
        None => headless_chrome::browser::default_executable().ok(),
    }
}

pub struct BrowserJobScraper {
    config: BrowserConfig,
    state: ScraperState,
    session: Option<BrowserSession>,
}

impl BrowserJobScraper {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            state: ScraperState::Uninitialized,
            session: None,
        }
    }

    pub fn state(&self) -> ScraperState {
        self.state
    }

    /// Launch Chrome. Launch failures propagate to the caller.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.state != ScraperState::Uninitialized {
            anyhow::bail!("Browser scraper cannot initialize from state {:?}", self.state);
        }

        let config = self.config.clone();
        let session = tokio::task::spawn_blocking(move || launch(&config))
            .await
            .context("Browser launch task panicked")??;

        self.session = Some(session);
        self.state = ScraperState::Initialized;
        info!("Browser scraper initialized successfully");
        Ok(())
    }

    /// Run one search. A results page that never renders yields an empty list.
    pub async fn search(&mut self, request: &SearchRequest) -> Result<Vec<JobListing>> {
        if self.state != ScraperState::Initialized {
            anyhow::bail!("Browser scraper cannot search from state {:?}", self.state);
        }
        let (browser, tab) = match &self.session {
            Some(session) => (Arc::clone(&session.browser), Arc::clone(&session.tab)),
            None => anyhow::bail!("Browser session missing"),
        };

        self.state = ScraperState::Searching;
        let result = self.run_search(browser, tab, request).await;
        if self.state == ScraperState::Searching {
            self.state = ScraperState::Initialized;
        }
        result
    }

    async fn run_search(
        &self,
        browser: Arc<Browser>,
        tab: Arc<Tab>,
        request: &SearchRequest,
    ) -> Result<Vec<JobListing>> {
        let url = browser_search_url(request);
        info!("Searching LinkedIn jobs: {}", url);

        on_tab(&tab, move |tab| {
            tab.navigate_to(&url)?;
            tab.wait_until_navigated()?;
            if let Err(e) = tab.evaluate(MASK_WEBDRIVER_JS, false) {
                debug!("Could not mask webdriver flag: {}", e);
            }
            Ok(())
        })
        .await
        .context("Failed to open search page")?;

        let timeout = self.config.timeout;
        let results_loaded = on_tab(&tab, move |tab| {
            tab.wait_for_element_with_custom_timeout(RESULTS_SELECTOR, timeout)
                .map(|_| ())
        })
        .await;
        if let Err(e) = results_loaded {
            warn!("Job listings did not load within timeout: {:#}", e);
            return Ok(Vec::new());
        }

        self.scroll_until_loaded(&tab, request.max_jobs).await?;

        let limit = request.max_jobs;
        let cards = on_tab(&tab, move |tab| Ok(read_cards(tab, limit))).await?;

        let mut jobs = Vec::with_capacity(cards.len());
        for (i, card) in cards.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(DETAIL_FETCH_DELAY).await;
            }

            let description = {
                let browser = Arc::clone(&browser);
                let job_url = card.job_url.clone();
                on_tab(&tab, move |tab| {
                    Ok(read_description(&browser, tab, &job_url, timeout))
                })
                .await
            };
            let description = match description {
                Ok(description) => description,
                Err(e) => {
                    warn!("Skipping job {}: {:#}", card.job_url, e);
                    continue;
                }
            };

            info!("Extracted job: {} at {}", card.title, card.company);
            jobs.push(
                JobListing::new(
                    card.title,
                    card.company,
                    card.location,
                    description,
                    card.job_url,
                    JobSource::Browser,
                )
                .with_posted_date(card.posted_date),
            );
        }

        info!("Successfully extracted {} job listings", jobs.len());
        Ok(jobs)
    }

    /// Scroll to the bottom until `max_jobs` cards are present, the page
    /// stops growing, or the scroll budget runs out
    async fn scroll_until_loaded(&self, tab: &Arc<Tab>, max_jobs: usize) -> Result<()> {
        let mut progress = ScrollProgress::new(on_tab(tab, scroll_height).await?, max_jobs);

        loop {
            on_tab(tab, |tab| {
                tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)?;
                Ok(())
            })
            .await?;

            tokio::time::sleep(SCROLL_PAUSE).await;

            let new_height = on_tab(tab, scroll_height).await?;
            let loaded = on_tab(tab, |tab| {
                Ok(tab.find_elements(CARD_SELECTOR).map(|c| c.len()).unwrap_or(0))
            })
            .await?;
            info!("Loaded {} job listings", loaded);

            match progress.record(new_height, loaded) {
                ScrollStep::Continue => {}
                ScrollStep::Enough | ScrollStep::Stable => break,
                ScrollStep::Exhausted => {
                    warn!(
                        "Stopped scrolling after {} passes with {} of {} listings loaded",
                        MAX_SCROLL_ATTEMPTS, loaded, max_jobs
                    );
                    break;
                }
            }
        }

        Ok(())
    }

    /// Release the browser. Safe to call in any state.
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            let result = tokio::task::spawn_blocking(move || {
                let closed = session.tab.close(false);
                drop(session);
                closed
            })
            .await;
            match result {
                Ok(Ok(_)) => info!("Browser scraper closed successfully"),
                Ok(Err(e)) => warn!("Error closing browser tab: {}", e),
                Err(e) => warn!("Browser close task panicked: {}", e),
            }
        }
        self.state = ScraperState::Closed;
    }
}

/// Strategy wrapper: one fresh scraper per attempt
pub struct BrowserStrategy {
    config: BrowserConfig,
}

impl BrowserStrategy {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SearchStrategy for BrowserStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn attempt(&self, request: &SearchRequest) -> Option<Vec<JobListing>> {
        let mut scraper = BrowserJobScraper::new(self.config.clone());

        if let Err(e) = scraper.initialize().await {
            warn!("Failed to initialize browser scraper: {:#}", e);
            scraper.close().await;
            return None;
        }

        let result = scraper.search(request).await;
        scraper.close().await;

        match result {
            Ok(jobs) if !jobs.is_empty() => Some(jobs),
            Ok(_) => None,
            Err(e) => {
                warn!("Browser scraper failed: {:#}", e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollStep {
    Continue,
    Enough,
    Stable,
    Exhausted,
}

/// Decides after each scroll pass whether another one is worth it
struct ScrollProgress {
    last_height: u64,
    max_jobs: usize,
    attempts: usize,
}

impl ScrollProgress {
    fn new(initial_height: u64, max_jobs: usize) -> Self {
        Self {
            last_height: initial_height,
            max_jobs,
            attempts: 0,
        }
    }

    fn record(&mut self, new_height: u64, loaded: usize) -> ScrollStep {
        self.attempts += 1;
        if loaded >= self.max_jobs {
            return ScrollStep::Enough;
        }
        if new_height == self.last_height {
            return ScrollStep::Stable;
        }
        self.last_height = new_height;
        if self.attempts >= MAX_SCROLL_ATTEMPTS {
            return ScrollStep::Exhausted;
        }
        ScrollStep::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_requires_initialize() {
        let mut scraper = BrowserJobScraper::new(BrowserConfig::default());
        assert_eq!(scraper.state(), ScraperState::Uninitialized);

        let err = scraper
            .search(&SearchRequest::new("rust"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Uninitialized"));
    }

    #[tokio::test]
    async fn test_close_without_session_is_harmless() {
        let mut scraper = BrowserJobScraper::new(BrowserConfig::default());
        scraper.close().await;
        assert_eq!(scraper.state(), ScraperState::Closed);
        assert!(scraper.initialize().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_chrome_binary_falls_through() {
        let strategy = BrowserStrategy::new(BrowserConfig {
            chrome_path: Some(PathBuf::from("/nonexistent/chrome-binary")),
            ..BrowserConfig::default()
        });
        assert!(strategy.attempt(&SearchRequest::new("rust")).await.is_none());
    }

    #[test]
    fn test_growing_page_without_cards_stops_at_budget() {
        let mut progress = ScrollProgress::new(1000, 25);
        let mut steps = Vec::new();
        for pass in 1..=MAX_SCROLL_ATTEMPTS + 5 {
            let step = progress.record(1000 + pass as u64 * 500, 0);
            steps.push(step);
            if step != ScrollStep::Continue {
                break;
            }
        }
        assert_eq!(steps.len(), MAX_SCROLL_ATTEMPTS);
        assert_eq!(steps.last(), Some(&ScrollStep::Exhausted));
    }

    #[test]
    fn test_scroll_stops_when_enough_or_stable() {
        let mut progress = ScrollProgress::new(1000, 25);
        assert_eq!(progress.record(1500, 10), ScrollStep::Continue);
        assert_eq!(progress.record(2000, 30), ScrollStep::Enough);

        let mut progress = ScrollProgress::new(1000, 25);
        assert_eq!(progress.record(1500, 10), ScrollStep::Continue);
        assert_eq!(progress.record(1500, 12), ScrollStep::Stable);
    }
}
