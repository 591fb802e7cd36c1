// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tracing::{error, info};

use crate::environment::AppConfig;
use crate::oauth::OAuthClient;
use crate::pipeline::SearchPipeline;
use crate::search::filters::FilterCatalog;
use crate::store::{KvStore, SqliteStore};
use crate::types::{CreateSpreadsheetRequest, SearchRequest, SearchTask};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[get("/")]
pub async fn root() -> Json<ApiInfo> {
    handlers::api_info_handler().await
}

#[get("/api")]
pub async fn api_info() -> Json<ApiInfo> {
    handlers::api_info_handler().await
}

#[get("/health")]
pub async fn health(state: &State<ServerState>) -> Json<HealthResponse> {
    handlers::health_handler(state).await
}

#[post("/search", data = "<request>")]
pub async fn search_jobs(
    request: Json<SearchRequest>,
    state: &State<ServerState>,
) -> Result<Json<JobSearchResponse>, ApiError> {
    handlers::search_handler(request, state).await
}

#[post("/search/async", data = "<request>")]
pub async fn search_jobs_async(
    request: Json<SearchRequest>,
    state: &State<ServerState>,
) -> Result<Json<AsyncSearchResponse>, ApiError> {
    handlers::search_async_handler(request, state).await
}

#[get("/search/status/<task_id>")]
pub async fn search_status(
    task_id: &str,
    state: &State<ServerState>,
) -> Result<Json<SearchTask>, ApiError> {
    handlers::search_status_handler(task_id, state).await
}

#[post("/spreadsheet/create", data = "<request>")]
pub async fn create_spreadsheet(
    request: Json<CreateSpreadsheetRequest>,
    state: &State<ServerState>,
) -> Result<Json<SpreadsheetResponse>, ApiError> {
    handlers::create_spreadsheet_handler(request, state).await
}

#[get("/spreadsheet/<spreadsheet_id>/info")]
pub async fn spreadsheet_info(
    spreadsheet_id: &str,
    state: &State<ServerState>,
) -> Result<Json<SpreadsheetInfoResponse>, ApiError> {
    handlers::spreadsheet_info_handler(spreadsheet_id, state).await
}

#[get("/jobs/filters")]
pub async fn job_filters() -> Json<FilterCatalog> {
    handlers::job_filters_handler().await
}

#[get("/config")]
pub async fn get_config(state: &State<ServerState>) -> Json<ConfigResponse> {
    handlers::config_handler(state).await
}

#[get("/auth/linkedin/login?<user_id>")]
pub async fn linkedin_login(
    user_id: Option<String>,
    server: &State<ServerState>,
) -> Result<Json<AuthLoginResponse>, ApiError> {
    handlers::login_handler(user_id, server).await
}

#[get("/auth/linkedin/callback?<code>&<state>&<error>")]
pub async fn linkedin_callback(
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    server: &State<ServerState>,
) -> Result<Json<AuthCallbackResponse>, ApiError> {
    handlers::callback_handler(code, state, error, server).await
}

#[get("/auth/status/<user_id>")]
pub async fn auth_status(
    user_id: &str,
    state: &State<ServerState>,
) -> Result<Json<AuthStatusResponse>, ApiError> {
    handlers::status_handler(user_id, state).await
}

#[post("/auth/logout/<user_id>")]
pub async fn logout(
    user_id: &str,
    state: &State<ServerState>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::logout_handler(user_id, state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["GET /api lists the service endpoints".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "VALIDATION_ERROR".to_string(),
        vec![
            "Verify all required fields are present".to_string(),
            "Check field types, e.g. max_jobs must be a number".to_string(),
        ],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

/// Assemble the rocket instance without binding, so tests can drive it
/// through a local client.
pub fn build_rocket(state: ServerState) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("port", state.config.port))
        .merge(("address", "0.0.0.0"));

    rocket::custom(figment)
        .attach(Cors)
        .manage(state)
        .register("/", catchers![bad_request, not_found, unprocessable, internal_error])
        .mount(
            "/",
            routes![
                root,
                api_info,
                health,
                search_jobs,
                search_jobs_async,
                search_status,
                create_spreadsheet,
                spreadsheet_info,
                job_filters,
                get_config,
                linkedin_login,
                linkedin_callback,
                auth_status,
                logout,
                options,
            ],
        )
}

fn oauth_client(config: &AppConfig, store: Arc<dyn KvStore>) -> Option<OAuthClient> {
    if !config.oauth_enabled() {
        info!("LinkedIn OAuth disabled: client id or secret not set");
        return None;
    }
    match OAuthClient::from_settings(&config.linkedin, store) {
        Ok(client) => Some(client),
        Err(e) => {
            info!("LinkedIn OAuth disabled: {}", e);
            None
        }
    }
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    config.ensure_directories().await?;

    let store = match SqliteStore::connect(&config.database_path).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize database: {:#}", e);
            return Err(e);
        }
    };

    if let Err(e) = store.migrate().await {
        error!("Failed to run database migrations: {:#}", e);
        return Err(e);
    }

    match store.purge_expired().await {
        Ok(purged) if purged > 0 => info!("Purged {} expired store entries", purged),
        Ok(_) => {}
        Err(e) => error!("Failed to purge expired entries: {:#}", e),
    }

    let store: Arc<dyn KvStore> = Arc::new(store);
    let pipeline = SearchPipeline::from_config(&config);
    let oauth = oauth_client(&config, Arc::clone(&store));

    info!("Starting LinkedIn job search API server");
    info!("Database: {}", config.database_path.display());
    info!("Search strategies: {}", pipeline.strategy_names().join(" -> "));
    info!("Server: http://0.0.0.0:{}", config.port);

    let state = ServerState::new(config, pipeline, store, oauth);

    let _rocket = build_rocket(state)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Web server failed: {}", e))?;

    Ok(())
}
