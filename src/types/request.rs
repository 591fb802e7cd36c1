// src/types/request.rs
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::search::filters::{DatePosted, EmploymentType, ExperienceLevel};

pub const DEFAULT_MAX_JOBS: usize = 25;
pub const MAX_JOBS_LIMIT: usize = 100;

fn default_max_jobs() -> usize {
    DEFAULT_MAX_JOBS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub keywords: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub employment_type: String,
    #[serde(default)]
    pub date_posted: String,
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default = "default_true")]
    pub filter_duplicates: bool,
}

impl SearchRequest {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: String::new(),
            requirements: Vec::new(),
            max_jobs: DEFAULT_MAX_JOBS,
            experience_level: String::new(),
            employment_type: String::new(),
            date_posted: String::new(),
            spreadsheet_id: None,
            filter_duplicates: true,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs;
        self
    }

    /// Reject malformed input before any scraping happens
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.keywords.trim().is_empty() {
            return Err(SearchError::validation("keywords", "must not be empty"));
        }
        if self.max_jobs == 0 {
            return Err(SearchError::validation("max_jobs", "must be at least 1"));
        }
        if self.max_jobs > MAX_JOBS_LIMIT {
            return Err(SearchError::validation(
                "max_jobs",
                format!("must not exceed {}", MAX_JOBS_LIMIT),
            ));
        }
        Ok(())
    }

    /// Requirements with blank entries removed
    pub fn effective_requirements(&self) -> Vec<String> {
        self.requirements
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn experience_level(&self) -> Option<ExperienceLevel> {
        ExperienceLevel::parse(&self.experience_level)
    }

    pub fn employment_type(&self) -> Option<EmploymentType> {
        EmploymentType::parse(&self.employment_type)
    }

    pub fn date_posted(&self) -> Option<DatePosted> {
        DatePosted::parse(&self.date_posted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpreadsheetRequest {
    pub title: String,
}
