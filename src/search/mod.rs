// src/search/mod.rs
//! Fallback search pipeline: browser, then plain HTTP, then synthetic data.

pub mod browser;
pub mod filters;
pub mod http;
pub mod matcher;
pub mod synthetic;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::environment::AppConfig;
use crate::error::SearchError;
use crate::types::{JobListing, SearchRequest};

pub use browser::{BrowserConfig, BrowserJobScraper, BrowserStrategy};
pub use http::HttpJobScraper;
pub use synthetic::SyntheticJobGenerator;

/// One way of producing listings.
///
/// `None` or an empty list tells the orchestrator to move on. Implementations
/// log their own failures instead of returning them.
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, request: &SearchRequest) -> Option<Vec<JobListing>>;
}

pub struct JobSearchService {
    strategies: Vec<Box<dyn SearchStrategy>>,
}

impl JobSearchService {
    pub fn new(strategies: Vec<Box<dyn SearchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Standard chain. The browser step is skipped when disabled in config.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut strategies: Vec<Box<dyn SearchStrategy>> = Vec::new();

        if config.browser.enabled {
            strategies.push(Box::new(BrowserStrategy::new(config.browser_config())));
        } else {
            info!("Browser scraping disabled, starting chain at HTTP scraper");
        }

        match HttpJobScraper::new() {
            Ok(scraper) => strategies.push(Box::new(scraper)),
            Err(e) => warn!("HTTP scraper unavailable: {:#}", e),
        }

        strategies.push(Box::new(SyntheticJobGenerator::new()));
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain and return at most `max_jobs` annotated listings.
    ///
    /// With requirements present only matching listings are kept.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<JobListing>, SearchError> {
        request.validate()?;

        info!(
            "Starting job search: '{}' in '{}'",
            request.keywords, request.location
        );

        let mut jobs = Vec::new();
        for strategy in &self.strategies {
            match strategy.attempt(request).await {
                Some(found) if !found.is_empty() => {
                    info!("{} strategy found {} jobs", strategy.name(), found.len());
                    jobs = found;
                    break;
                }
                _ => warn!("{} strategy found no jobs, falling back", strategy.name()),
            }
        }

        jobs.truncate(request.max_jobs);

        let requirements = request.effective_requirements();
        for job in &mut jobs {
            let result = matcher::match_job(job, &requirements);
            job.apply_match(result);
        }

        if !requirements.is_empty() {
            let before = jobs.len();
            jobs.retain(|job| job.is_match == Some(true));
            info!("Found {} matching jobs out of {}", jobs.len(), before);
        }

        Ok(jobs)
    }
}
