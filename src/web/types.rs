// src/web/types.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::environment::AppConfig;
use crate::oauth::OAuthClient;
use crate::pipeline::SearchPipeline;
use crate::store::KvStore;
use crate::types::{JobListing, SearchOutcome, SearchRequest, TaskStatus};
use crate::utils::current_timestamp;

pub const API_NAME: &str = "LinkedIn Job Search API";
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const API_DESCRIPTION: &str = "API for searching LinkedIn jobs and adding them to Google Sheets";

/// Shared state handed to every route
pub struct ServerState {
    pub config: AppConfig,
    pub pipeline: Arc<SearchPipeline>,
    pub store: Arc<dyn KvStore>,
    pub oauth: Option<OAuthClient>,
    pub search_permits: Arc<Semaphore>,
}

impl ServerState {
    pub fn new(
        config: AppConfig,
        pipeline: SearchPipeline,
        store: Arc<dyn KvStore>,
        oauth: Option<OAuthClient>,
    ) -> Self {
        let permits = config.max_concurrent_searches.max(1);
        Self {
            config,
            pipeline: Arc::new(pipeline),
            store,
            oauth,
            search_permits: Arc::new(Semaphore::new(permits)),
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

pub type ApiError = (Status, Json<StandardErrorResponse>);

pub fn api_error(status: Status, error: impl Into<String>, error_code: &str, suggestions: &[&str]) -> ApiError {
    (
        status,
        Json(StandardErrorResponse::new(
            error.into(),
            error_code.to_string(),
            suggestions.iter().map(|s| s.to_string()).collect(),
        )),
    )
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ApiInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub health: &'static str,
}

impl Default for ApiInfo {
    fn default() -> Self {
        Self {
            name: API_NAME,
            version: API_VERSION,
            description: API_DESCRIPTION,
            health: "/health",
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthServices {
    pub chrome: String,
    pub google_sheets: String,
    pub linkedin_oauth: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: &'static str,
    pub services: HealthServices,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobSearchResponse {
    pub success: bool,
    pub message: String,
    pub jobs_found: usize,
    pub matching_jobs: usize,
    pub jobs_added_to_sheets: Option<usize>,
    pub spreadsheet_url: Option<String>,
    pub jobs: Vec<JobListing>,
    pub search_params: SearchRequest,
    pub timestamp: String,
}

impl JobSearchResponse {
    pub fn from_outcome(outcome: SearchOutcome, search_params: SearchRequest) -> Self {
        Self {
            success: true,
            message: outcome.summary(),
            jobs_found: outcome.jobs_found,
            matching_jobs: outcome.matching_jobs,
            jobs_added_to_sheets: outcome.jobs_added_to_sheets,
            spreadsheet_url: outcome.spreadsheet_url,
            jobs: outcome.jobs,
            search_params,
            timestamp: current_timestamp(),
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AsyncSearchResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
    pub status_url: String,
}

#[derive(Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SpreadsheetResponse {
    pub success: bool,
    pub message: String,
    pub spreadsheet_id: Option<String>,
    pub spreadsheet_url: Option<String>,
    pub title: Option<String>,
    pub timestamp: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SpreadsheetInfoResponse {
    pub success: bool,
    pub spreadsheet_id: String,
    pub title: String,
    pub url: String,
    pub sheets: Vec<String>,
    pub existing_jobs_count: usize,
    pub timestamp: String,
}

/// Settings safe to show to any caller
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ConfigResponse {
    pub max_jobs_per_search: usize,
    pub max_concurrent_searches: usize,
    pub job_search_timeout: u64,
    pub browser_enabled: bool,
    pub chrome_headless: bool,
    pub search_strategies: Vec<&'static str>,
    pub google_credentials_configured: bool,
    pub default_spreadsheet_configured: bool,
    pub linkedin_oauth_enabled: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AuthLoginResponse {
    pub success: bool,
    pub authorization_url: String,
    pub state: String,
    pub user_id: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AuthCallbackResponse {
    pub success: bool,
    pub message: String,
    pub user_id: String,
    pub expires_in: u64,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AuthStatusResponse {
    pub success: bool,
    pub user_id: String,
    pub authenticated: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}
