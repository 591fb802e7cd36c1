// tests/web_api.rs
use async_trait::async_trait;
use job_sheets::environment::{AppConfig, LinkedInOAuthSettings};
use job_sheets::oauth::OAuthClient;
use job_sheets::pipeline::SearchPipeline;
use job_sheets::search::{JobSearchService, SearchStrategy, SyntheticJobGenerator};
use job_sheets::sheets::{MemorySheets, SpreadsheetBackend};
use job_sheets::store::{KvStore, MemoryStore};
use job_sheets::types::{JobListing, JobSource, SearchRequest};
use job_sheets::web::{build_rocket, ServerState};
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SHEET_ID: &str = "sheet-1";

struct Listings(Vec<JobListing>);

#[async_trait]
impl SearchStrategy for Listings {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn attempt(&self, _request: &SearchRequest) -> Option<Vec<JobListing>> {
        Some(self.0.clone())
    }
}

fn listings() -> Vec<JobListing> {
    vec![
        JobListing::new(
            "Rust Engineer",
            "Ferrous",
            "Remote",
            "Tokio, Serde and PostgreSQL",
            "https://www.linkedin.com/jobs/view/1",
            JobSource::Browser,
        ),
        JobListing::new(
            "Go Engineer",
            "Gopher Inc",
            "Berlin",
            "Kubernetes operators",
            "https://www.linkedin.com/jobs/view/2",
            JobSource::Browser,
        ),
    ]
}

struct Harness {
    client: Client,
    sheets: Arc<MemorySheets>,
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.browser.enabled = false;
    config.google_credentials_path = "does-not-exist/credentials.json".into();
    config
}

async fn harness_with(oauth: Option<LinkedInOAuthSettings>, token_url: Option<String>) -> Harness {
    let sheets = Arc::new(MemorySheets::new());
    sheets.insert_sheet(SHEET_ID, "Job Hunt").await;

    let backend: Arc<dyn SpreadsheetBackend> = sheets.clone();
    let search = JobSearchService::new(vec![
        Box::new(Listings(listings())),
        Box::new(SyntheticJobGenerator::new()),
    ]);
    let pipeline = SearchPipeline::new(search, Some(backend));

    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let oauth = oauth.map(|settings| {
        let client = OAuthClient::from_settings(&settings, Arc::clone(&store)).unwrap();
        match &token_url {
            Some(url) => client.with_token_url(url.clone()),
            None => client,
        }
    });

    let state = ServerState::new(test_config(), pipeline, store, oauth);
    let client = Client::tracked(build_rocket(state)).await.unwrap();
    Harness { client, sheets }
}

async fn harness() -> Harness {
    harness_with(None, None).await
}

fn oauth_settings() -> LinkedInOAuthSettings {
    LinkedInOAuthSettings {
        client_id: Some("client-123".to_string()),
        client_secret: Some("secret".to_string()),
        ..LinkedInOAuthSettings::default()
    }
}

/// Minimal token endpoint: reads one full request, answers with `body`
async fn token_server(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let Ok(n) = socket.read(&mut buf).await else { break };
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/oauth/v2/accessToken", addr)
}

async fn get_json(client: &Client, uri: &str) -> (Status, Value) {
    let response = client.get(uri.to_string()).dispatch().await;
    let status = response.status();
    (status, response.into_json().await.unwrap_or(Value::Null))
}

async fn post_json(client: &Client, uri: &str, body: Value) -> (Status, Value) {
    let response = client.post(uri.to_string()).json(&body).dispatch().await;
    let status = response.status();
    (status, response.into_json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_api_info_and_health() {
    let h = harness().await;

    let (status, info) = get_json(&h.client, "/").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(info["name"], "LinkedIn Job Search API");
    assert_eq!(get_json(&h.client, "/api").await.1, info);

    let (status, health) = get_json(&h.client, "/health").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["services"]["chrome"], "disabled");
    assert_eq!(health["services"]["google_sheets"], "credentials_missing");
    assert_eq!(health["services"]["linkedin_oauth"], "not_configured");
}

#[tokio::test]
async fn test_config_and_filters() {
    let h = harness().await;

    let (status, config) = get_json(&h.client, "/config").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(config["search_strategies"], json!(["fixture", "synthetic"]));
    assert_eq!(config["browser_enabled"], false);
    assert_eq!(config["linkedin_oauth_enabled"], false);
    assert!(config.get("google_credentials_path").is_none());

    let (status, filters) = get_json(&h.client, "/jobs/filters").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(filters["experience_levels"][0]["label"], "Any");
    assert!(filters["employment_types"].as_array().unwrap().len() > 1);
    assert!(filters["date_posted"].as_array().unwrap().len() > 1);
}

#[tokio::test]
async fn test_search_filters_and_exports() {
    let h = harness().await;
    let body = json!({
        "keywords": "rust",
        "requirements": ["Tokio", "Serde"],
        "spreadsheet_id": SHEET_ID
    });

    let (status, result) = post_json(&h.client, "/search", body.clone()).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(result["success"], true);
    assert_eq!(result["jobs_found"], 1);
    assert_eq!(result["jobs"][0]["title"], "Rust Engineer");
    assert_eq!(result["jobs_added_to_sheets"], 1);
    assert_eq!(result["search_params"]["keywords"], "rust");
    assert_eq!(h.sheets.rows(SHEET_ID).await.len(), 2);

    let (status, again) = post_json(&h.client, "/search", body).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(again["jobs_added_to_sheets"], 0);
    assert_eq!(h.sheets.rows(SHEET_ID).await.len(), 2);
}

#[tokio::test]
async fn test_export_failure_keeps_search_result() {
    let h = harness().await;
    h.sheets.set_failing(true);

    let (status, result) = post_json(
        &h.client,
        "/search",
        json!({"keywords": "engineer", "spreadsheet_id": SHEET_ID}),
    )
    .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(result["jobs_found"], 2);
    assert!(result["jobs_added_to_sheets"].is_null());
}

#[tokio::test]
async fn test_search_rejects_bad_input() {
    let h = harness().await;

    let (status, error) = post_json(&h.client, "/search", json!({"keywords": "  "})).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(error["success"], false);
    assert_eq!(error["error_code"], "VALIDATION_ERROR");

    let (status, error) =
        post_json(&h.client, "/search", json!({"keywords": "rust", "max_jobs": 500})).await;
    assert_eq!(status, Status::BadRequest);
    assert!(error["error"].as_str().unwrap().contains("max_jobs"));

    let (status, error) = post_json(&h.client, "/search", json!({"location": "Remote"})).await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(error["error_code"], "VALIDATION_ERROR");

    let response = h
        .client
        .post("/search")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[tokio::test]
async fn test_bad_search_is_rejected_while_searches_are_busy() {
    let search = JobSearchService::new(vec![Box::new(SyntheticJobGenerator::new())]);
    let state = ServerState::new(
        test_config(),
        SearchPipeline::new(search, None),
        Arc::new(MemoryStore::new()),
        None,
    );
    let permits = Arc::clone(&state.search_permits);
    let all = permits.available_permits() as u32;
    let _held = permits.acquire_many_owned(all).await.unwrap();
    let client = Client::tracked(build_rocket(state)).await.unwrap();

    let (status, error) = tokio::time::timeout(
        Duration::from_secs(5),
        post_json(&client, "/search", json!({"keywords": "rust", "max_jobs": 0})),
    )
    .await
    .expect("validation waited for a search permit");
    assert_eq!(status, Status::BadRequest);
    assert_eq!(error["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_async_search_completes() {
    let h = harness().await;

    let (status, started) =
        post_json(&h.client, "/search/async", json!({"keywords": "engineer"})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(started["status"], "started");
    let task_id = started["task_id"].as_str().unwrap().to_string();
    assert_eq!(started["status_url"], format!("/search/status/{}", task_id));

    let mut task = Value::Null;
    for _ in 0..100 {
        let (status, body) = get_json(&h.client, &format!("/search/status/{}", task_id)).await;
        assert_eq!(status, Status::Ok);
        if body["status"] == "completed" || body["status"] == "failed" {
            task = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(task["status"], "completed");
    assert_eq!(task["result"]["jobs_found"], 2);
    assert_eq!(task["request"]["keywords"], "engineer");
}

#[tokio::test]
async fn test_async_search_validates_up_front() {
    let h = harness().await;
    let (status, error) = post_json(&h.client, "/search/async", json!({"keywords": ""})).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(error["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_task_is_404() {
    let h = harness().await;
    let (status, error) = get_json(&h.client, "/search/status/nope").await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(error["error_code"], "TASK_NOT_FOUND");
}

#[tokio::test]
async fn test_spreadsheet_create_and_info() {
    let h = harness().await;

    let (status, created) =
        post_json(&h.client, "/spreadsheet/create", json!({"title": "Rust roles"})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(created["title"], "Rust roles");
    let id = created["spreadsheet_id"].as_str().unwrap().to_string();
    assert_eq!(created["spreadsheet_url"], h.sheets.sheet_url(&id));

    let (status, info) = get_json(&h.client, &format!("/spreadsheet/{}/info", id)).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(info["existing_jobs_count"], 0);
    assert_eq!(info["sheets"], json!(["Job Listings"]));

    post_json(
        &h.client,
        "/search",
        json!({"keywords": "engineer", "spreadsheet_id": id}),
    )
    .await;
    let (_, info) = get_json(&h.client, &format!("/spreadsheet/{}/info", id)).await;
    assert_eq!(info["existing_jobs_count"], 2);
}

#[tokio::test]
async fn test_spreadsheet_errors() {
    let h = harness().await;

    let (status, error) = post_json(&h.client, "/spreadsheet/create", json!({"title": " "})).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(error["error_code"], "VALIDATION_ERROR");

    let (status, error) = get_json(&h.client, "/spreadsheet/unknown/info").await;
    assert_eq!(status, Status::InternalServerError);
    assert_eq!(error["error_code"], "SHEETS_ERROR");
}

#[tokio::test]
async fn test_sheets_unavailable_without_backend() {
    let search = JobSearchService::new(vec![Box::new(SyntheticJobGenerator::new())]);
    let state = ServerState::new(
        test_config(),
        SearchPipeline::new(search, None),
        Arc::new(MemoryStore::new()),
        None,
    );
    let client = Client::tracked(build_rocket(state)).await.unwrap();

    let (status, error) = post_json(&client, "/spreadsheet/create", json!({"title": "x"})).await;
    assert_eq!(status, Status::ServiceUnavailable);
    assert_eq!(error["error_code"], "SHEETS_UNAVAILABLE");

    // search still works, export is skipped
    let (status, result) = post_json(
        &client,
        "/search",
        json!({"keywords": "python", "max_jobs": 3, "spreadsheet_id": "any"}),
    )
    .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(result["jobs_found"], 3);
    assert!(result["jobs_added_to_sheets"].is_null());
}

#[tokio::test]
async fn test_oauth_routes_without_credentials() {
    let h = harness().await;
    let (status, error) = get_json(&h.client, "/auth/linkedin/login").await;
    assert_eq!(status, Status::ServiceUnavailable);
    assert_eq!(error["error_code"], "OAUTH_NOT_CONFIGURED");

    let (status, _) = get_json(&h.client, "/auth/status/someone").await;
    assert_eq!(status, Status::ServiceUnavailable);
}

#[tokio::test]
async fn test_oauth_token_lifecycle() {
    let token_url = token_server(r#"{"access_token": "tok-1", "expires_in": 1800}"#).await;
    let h = harness_with(Some(oauth_settings()), Some(token_url)).await;

    let (status, login) = get_json(&h.client, "/auth/linkedin/login?user_id=alice").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(login["user_id"], "alice");
    let state = login["state"].as_str().unwrap().to_string();
    assert!(login["authorization_url"]
        .as_str()
        .unwrap()
        .contains(&format!("state={}", state)));

    let (_, status_body) = get_json(&h.client, "/auth/status/alice").await;
    assert_eq!(status_body["authenticated"], false);

    let callback = format!("/auth/linkedin/callback?code=abc&state={}", state);
    let (status, done) = get_json(&h.client, &callback).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(done["user_id"], "alice");
    assert_eq!(done["expires_in"], 1800);

    let (_, status_body) = get_json(&h.client, "/auth/status/alice").await;
    assert_eq!(status_body["authenticated"], true);

    // state is single-use
    let (status, error) = get_json(&h.client, &callback).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(error["error_code"], "INVALID_STATE");

    let (status, logout) = post_json(&h.client, "/auth/logout/alice", json!({})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(logout["message"], "Logged out user: alice");

    let (_, status_body) = get_json(&h.client, "/auth/status/alice").await;
    assert_eq!(status_body["authenticated"], false);
}

#[tokio::test]
async fn test_oauth_login_generates_user_id_and_handles_denial() {
    let h = harness_with(Some(oauth_settings()), None).await;

    let (status, login) = get_json(&h.client, "/auth/linkedin/login").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(login["user_id"].as_str().unwrap().len(), 36);

    let (status, error) = get_json(
        &h.client,
        "/auth/linkedin/callback?error=user_cancelled_login",
    )
    .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(error["error_code"], "OAUTH_DENIED");

    let (status, error) = get_json(&h.client, "/auth/linkedin/callback?code=abc").await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(error["error_code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_cors_and_catchers() {
    let h = harness().await;

    let response = h.client.options("/search").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );

    let (status, error) = get_json(&h.client, "/no/such/route").await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(error["error_code"], "NOT_FOUND");
}
