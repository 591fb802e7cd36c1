// src/search/http.rs
//! Browserless scraper: plain GETs against the public search page, parsed by
//! class-name heuristics rather than a fixed schema.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::filters::{absolutize_link, http_search_url, JOB_SEARCH_URL};
use super::{matcher, SearchStrategy};
use crate::types::{JobListing, JobSource, SearchRequest, PLACEHOLDER_URL};
use crate::utils::{clean_text, extract_salary};

/// Mandatory pause between page fetches
pub const PAGE_FETCH_DELAY: Duration = Duration::from_secs(2);

pub const JOBS_PER_PAGE: usize = 25;
pub const MAX_PAGES: usize = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const HTTP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Titles that show up when a sign-in wall gets parsed as a listing
pub const PLACEHOLDER_TITLES: &[&str] = &["Job Title", "Sign in to create job alert"];

const CARD_SELECTOR: &str =
    "div[class*='job'], li[class*='job'], div[class*='result'], li[class*='result']";
const TITLE_SELECTOR: &str = "h3[class*='title'], h3[class*='job'], h4[class*='title'], h4[class*='job'], a[class*='title'], a[class*='job']";
const COMPANY_SELECTOR: &str = "span[class*='company'], div[class*='company'], a[class*='company']";
const LOCATION_SELECTOR: &str = "span[class*='location'], div[class*='location']";
const LINK_SELECTOR: &str = "a[href]";
const DESCRIPTION_SELECTOR: &str = "div[class*='description'], div[class*='summary'], span[class*='description'], span[class*='summary']";

struct CardSelectors {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    link: Selector,
    description: Selector,
}

impl CardSelectors {
    fn new() -> Result<Self> {
        let parse = |s: &str| {
            Selector::parse(s).map_err(|e| anyhow::anyhow!("Invalid selector '{}': {}", s, e))
        };
        Ok(Self {
            card: parse(CARD_SELECTOR)?,
            title: parse(TITLE_SELECTOR)?,
            company: parse(COMPANY_SELECTOR)?,
            location: parse(LOCATION_SELECTOR)?,
            link: parse(LINK_SELECTOR)?,
            description: parse(DESCRIPTION_SELECTOR)?,
        })
    }
}

pub struct HttpJobScraper {
    client: Client,
    search_url: String,
}

impl HttpJobScraper {
    pub fn new() -> Result<Self> {
        Self::with_search_url(JOB_SEARCH_URL)
    }

    /// Point the scraper at a different search endpoint
    pub fn with_search_url(search_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));

        let client = Client::builder()
            .user_agent(HTTP_USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            search_url: search_url.into(),
        })
    }

    /// Collect up to `max_jobs` listings across at most three result pages
    pub async fn search_jobs(&self, request: &SearchRequest) -> Vec<JobListing> {
        let requirements = request.effective_requirements();
        let pages = (request.max_jobs / JOBS_PER_PAGE + 1).min(MAX_PAGES);
        let mut jobs = Vec::new();

        info!(
            "Using HTTP scraper for: {} in {}",
            request.keywords, request.location
        );

        for page in 0..pages {
            if page > 0 {
                tokio::time::sleep(PAGE_FETCH_DELAY).await;
            }

            let url = http_search_url(&self.search_url, request, page * JOBS_PER_PAGE);
            let html = match self.fetch_page(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to scrape page {}: {:#}", page, e);
                    continue;
                }
            };

            jobs.extend(parse_job_listings(&html, &requirements));
            if jobs.len() >= request.max_jobs {
                jobs.truncate(request.max_jobs);
                break;
            }
        }

        info!("HTTP scraper extracted {} job cards", jobs.len());
        jobs
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Fetching search page: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response
            .text()
            .await
            .context("Failed to read response body")
    }
}

/// True when at least one listing is something other than page noise
pub fn has_usable_jobs(jobs: &[JobListing]) -> bool {
    jobs.iter()
        .any(|job| !PLACEHOLDER_TITLES.contains(&job.title.as_str()))
}

fn first_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
}

fn extract_job_info(card: &ElementRef<'_>, selectors: &CardSelectors, requirements: &[String]) -> JobListing {
    let title = first_text(card, &selectors.title).unwrap_or_else(|| "Job Title".to_string());
    let company = first_text(card, &selectors.company).unwrap_or_else(|| "Company".to_string());
    let location = first_text(card, &selectors.location).unwrap_or_else(|| "Location".to_string());

    let link = card
        .select(&selectors.link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize_link(href.trim()))
        .unwrap_or_else(|| PLACEHOLDER_URL.to_string());

    let description = first_text(card, &selectors.description)
        .unwrap_or_else(|| format!("Job opportunity at {}", company));

    let salary = extract_salary(&description);

    let mut job = JobListing::new(title, company, location, description, link, JobSource::Http)
        .with_posted_date(Some("Recently".to_string()))
        .with_salary_range(salary);

    let result = matcher::match_job(&job, requirements);
    job.apply_match(result);
    job
}

/// Parse one results page. Missing fields get placeholders, never errors.
pub fn parse_job_listings(html: &str, requirements: &[String]) -> Vec<JobListing> {
    let selectors = match CardSelectors::new() {
        Ok(selectors) => selectors,
        Err(e) => {
            warn!("Failed to build card selectors: {}", e);
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    document
        .select(&selectors.card)
        .take(JOBS_PER_PAGE)
        .map(|card| extract_job_info(&card, &selectors, requirements))
        .collect()
}

#[async_trait]
impl SearchStrategy for HttpJobScraper {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn attempt(&self, request: &SearchRequest) -> Option<Vec<JobListing>> {
        let jobs = self.search_jobs(request).await;
        if has_usable_jobs(&jobs) {
            Some(jobs)
        } else {
            info!("HTTP scraper found only placeholder listings");
            None
        }
    }
}
