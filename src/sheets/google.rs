// src/sheets/google.rs
//! Google Sheets v4 over REST, authenticated as a service account.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{SpreadsheetBackend, DATA_RANGE, HEADERS, HEADER_RANGE, SHEET_NAME};
use crate::types::SpreadsheetInfo;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this many seconds before the token actually expires
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

pub struct GoogleSheetsClient {
    http: Client,
    key: ServiceAccountKey,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsClient {
    pub fn from_credentials_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Google credentials file not found: {}. Download a service account key first.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let key: ServiceAccountKey =
            serde_json::from_str(&content).context("Invalid service account key")?;

        info!("Loaded Google service account: {}", key.client_email);
        Self::new(key)
    }

    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            key,
            token: Mutex::new(None),
        })
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Service account private key is not valid RSA PEM")?;
        encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .context("Failed to sign service account assertion")
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        debug!("Requesting Google access token");
        let assertion = self.signed_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("Token request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token endpoint returned {}: {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        let fresh = CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        };
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .context("Sheets API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sheets API returned {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Sheets API response")
    }

    fn values_url(spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_API,
            spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    async fn write_headers(&self, spreadsheet_id: &str, sheet_id: i64) -> Result<()> {
        let url = format!(
            "{}?valueInputOption=RAW",
            Self::values_url(spreadsheet_id, HEADER_RANGE)
        );
        self.send(self.http.put(url).json(&json!({ "values": [HEADERS] })))
            .await
            .context("Failed to write header row")?;

        let format_request = json!({
            "requests": [{
                "repeatCell": {
                    "range": {
                        "sheetId": sheet_id,
                        "startRowIndex": 0,
                        "endRowIndex": 1,
                        "startColumnIndex": 0,
                        "endColumnIndex": HEADERS.len(),
                    },
                    "cell": {
                        "userEnteredFormat": {
                            "textFormat": { "bold": true },
                            "backgroundColor": { "red": 0.9, "green": 0.9, "blue": 0.9 },
                        }
                    },
                    "fields": "userEnteredFormat(textFormat,backgroundColor)",
                }
            }]
        });
        let url = format!("{}/{}:batchUpdate", SHEETS_API, spreadsheet_id);
        self.send(self.http.post(url).json(&format_request))
            .await
            .context("Failed to format header row")?;

        info!("Headers set up successfully");
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetBackend for GoogleSheetsClient {
    async fn create_sheet(&self, title: &str) -> Result<String> {
        let body = json!({
            "properties": { "title": title },
            "sheets": [{
                "properties": {
                    "title": SHEET_NAME,
                    "gridProperties": { "rowCount": 1000, "columnCount": 20 },
                }
            }]
        });

        let created = self
            .send(self.http.post(SHEETS_API).json(&body))
            .await
            .context("Failed to create spreadsheet")?;

        let spreadsheet_id = created["spreadsheetId"]
            .as_str()
            .context("Create response has no spreadsheetId")?
            .to_string();
        let sheet_id = created["sheets"][0]["properties"]["sheetId"]
            .as_i64()
            .unwrap_or(0);

        self.write_headers(&spreadsheet_id, sheet_id).await?;

        info!("Created new spreadsheet: {} (ID: {})", title, spreadsheet_id);
        Ok(spreadsheet_id)
    }

    async fn read_column(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<String>> {
        let body = self
            .send(self.http.get(Self::values_url(spreadsheet_id, range)))
            .await
            .with_context(|| format!("Failed to read {}", range))?;

        Ok(body["values"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| row[0].as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn append_rows(&self, spreadsheet_id: &str, rows: Vec<Vec<String>>) -> Result<u64> {
        let url = format!(
            "{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            Self::values_url(spreadsheet_id, DATA_RANGE)
        );
        let body = self
            .send(self.http.post(url).json(&json!({ "values": rows })))
            .await
            .context("Failed to append rows")?;

        Ok(body["updates"]["updatedCells"].as_u64().unwrap_or(0))
    }

    async fn get_metadata(&self, spreadsheet_id: &str) -> Result<SpreadsheetInfo> {
        let url = format!(
            "{}/{}?fields=properties.title,sheets.properties.title",
            SHEETS_API, spreadsheet_id
        );
        let body = self
            .send(self.http.get(url))
            .await
            .context("Failed to get spreadsheet info")?;

        let sheets = body["sheets"]
            .as_array()
            .map(|sheets| {
                sheets
                    .iter()
                    .filter_map(|s| s["properties"]["title"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(SpreadsheetInfo {
            title: body["properties"]["title"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            url: self.sheet_url(spreadsheet_id),
            sheets,
        })
    }
}
