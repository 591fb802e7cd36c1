// src/types/job.rs
use serde::{Deserialize, Serialize};

/// URL used when a card carries no usable link. Never a dedup key.
pub const PLACEHOLDER_URL: &str = "#";

/// Where a listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSource {
    Browser,
    Http,
    Synthetic,
}

impl JobSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::Browser => "browser",
            JobSource::Http => "http",
            JobSource::Synthetic => "synthetic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matches: Vec<String>,
    pub match_score: f64,
    pub is_match: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_url: String,
    pub posted_date: Option<String>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub salary_range: Option<String>,
    #[serde(default)]
    pub matches: Vec<String>,
    pub match_score: Option<f64>,
    pub is_match: Option<bool>,
    pub source: JobSource,
}

impl JobListing {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
        job_url: impl Into<String>,
        source: JobSource,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: location.into(),
            description: description.into(),
            job_url: job_url.into(),
            posted_date: None,
            employment_type: None,
            experience_level: None,
            salary_range: None,
            matches: Vec::new(),
            match_score: None,
            is_match: None,
            source,
        }
    }

    pub fn with_posted_date(mut self, posted_date: Option<String>) -> Self {
        self.posted_date = posted_date;
        self
    }

    pub fn with_salary_range(mut self, salary_range: Option<String>) -> Self {
        self.salary_range = salary_range;
        self
    }

    /// Text the requirement matcher runs against
    pub fn match_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    pub fn apply_match(&mut self, result: MatchResult) {
        self.matches = result.matches;
        self.match_score = Some(result.match_score);
        self.is_match = Some(result.is_match);
    }

    /// True when `job_url` can identify the listing in a sheet
    pub fn has_real_url(&self) -> bool {
        let url = self.job_url.trim();
        !url.is_empty() && url != PLACEHOLDER_URL
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == JobSource::Synthetic
    }
}
