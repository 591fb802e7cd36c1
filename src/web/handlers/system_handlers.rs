// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::search::browser::chrome_executable;
use crate::search::filters::{filter_catalog, FilterCatalog};
use crate::utils::current_timestamp;
use crate::web::types::*;

pub async fn api_info_handler() -> Json<ApiInfo> {
    Json(ApiInfo::default())
}

pub async fn health_handler(state: &State<ServerState>) -> Json<HealthResponse> {
    let config = &state.config;

    let chrome = if !config.browser.enabled {
        "disabled".to_string()
    } else {
        let browser_config = config.browser_config();
        match tokio::task::spawn_blocking(move || chrome_executable(&browser_config)).await {
            Ok(Some(path)) => format!("available: {}", path.display()),
            Ok(None) => "missing".to_string(),
            Err(e) => format!("error: {}", e),
        }
    };

    let google_sheets = if config.credentials_present() {
        "credentials_found"
    } else {
        "credentials_missing"
    };

    let linkedin_oauth = if state.oauth.is_some() {
        "configured"
    } else {
        "not_configured"
    };

    info!("Health check: chrome={}, sheets={}", chrome, google_sheets);
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: current_timestamp(),
        version: API_VERSION,
        services: HealthServices {
            chrome,
            google_sheets: google_sheets.to_string(),
            linkedin_oauth: linkedin_oauth.to_string(),
        },
    })
}

pub async fn job_filters_handler() -> Json<FilterCatalog> {
    Json(filter_catalog())
}

pub async fn config_handler(state: &State<ServerState>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        max_jobs_per_search: config.max_jobs_per_search,
        max_concurrent_searches: config.max_concurrent_searches,
        job_search_timeout: config.job_search_timeout,
        browser_enabled: config.browser.enabled,
        chrome_headless: config.browser.headless,
        search_strategies: state.pipeline.strategy_names(),
        google_credentials_configured: config.credentials_present(),
        default_spreadsheet_configured: config.google_spreadsheet_id.is_some(),
        linkedin_oauth_enabled: state.oauth.is_some(),
    })
}
