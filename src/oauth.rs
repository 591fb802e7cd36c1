// src/oauth.rs
//! LinkedIn OAuth 2.0 authorization-code flow, reduced to the token lifecycle.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::environment::LinkedInOAuthSettings;
use crate::error::OAuthError;
use crate::store::{get_json, put_json, KvStore};

pub const AUTHORIZATION_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
pub const TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";

/// How long a login attempt may take before its state is forgotten
pub const STATE_TTL: Duration = Duration::from_secs(600);

const DEFAULT_EXPIRES_IN: u64 = 3600;

fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PendingLogin {
    user_id: String,
}

fn token_key(user_id: &str) -> String {
    format!("oauth:token:{}", user_id)
}

fn state_key(state: &str) -> String {
    format!("oauth:state:{}", state)
}

/// Per-user tokens, each living for its own `expires_in`
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KvStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn store_token(&self, user_id: &str, token: &TokenData) -> anyhow::Result<()> {
        let ttl = Duration::from_secs(token.expires_in);
        put_json(self.store.as_ref(), &token_key(user_id), token, Some(ttl)).await?;
        info!("Token stored for user: {}", user_id);
        Ok(())
    }

    pub async fn get_token(&self, user_id: &str) -> anyhow::Result<Option<TokenData>> {
        get_json(self.store.as_ref(), &token_key(user_id)).await
    }

    pub async fn is_authenticated(&self, user_id: &str) -> anyhow::Result<bool> {
        Ok(self.get_token(user_id).await?.is_some())
    }

    pub async fn remove_token(&self, user_id: &str) -> anyhow::Result<bool> {
        let removed = self.store.remove(&token_key(user_id)).await?;
        if removed {
            info!("Token removed for user: {}", user_id);
        }
        Ok(removed)
    }
}

pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    token_url: String,
    http: Client,
    store: Arc<dyn KvStore>,
    tokens: TokenStore,
}

impl OAuthClient {
    pub fn from_settings(
        settings: &LinkedInOAuthSettings,
        store: Arc<dyn KvStore>,
    ) -> Result<Self, OAuthError> {
        let (Some(client_id), Some(client_secret)) =
            (settings.client_id.clone(), settings.client_secret.clone())
        else {
            return Err(OAuthError::NotConfigured);
        };

        let scopes = settings
            .scopes
            .split([',', ' '])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        info!("LinkedIn OAuth client initialized");
        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: settings.redirect_uri.clone(),
            scopes,
            token_url: TOKEN_URL.to_string(),
            http: Client::new(),
            tokens: TokenStore::new(Arc::clone(&store)),
            store,
        })
    }

    /// Point the code exchange at another token endpoint
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Build the consent URL and remember its state for `STATE_TTL`.
    /// Returns `(url, state)`.
    pub async fn authorization_url(&self, user_id: &str) -> Result<(String, String), OAuthError> {
        let state = uuid::Uuid::new_v4().to_string();
        put_json(
            self.store.as_ref(),
            &state_key(&state),
            &PendingLogin {
                user_id: user_id.to_string(),
            },
            Some(STATE_TTL),
        )
        .await?;

        let params = [
            ("response_type", "code".to_string()),
            ("client_id", self.client_id.clone()),
            ("redirect_uri", self.redirect_uri.clone()),
            ("scope", self.scopes.join(" ")),
            ("state", state.clone()),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        info!("Generated authorization URL with state: {}", state);
        Ok((format!("{}?{}", AUTHORIZATION_URL, query), state))
    }

    /// Trade an authorization code for a token. The state is single-use.
    /// Returns the user the login was started for.
    pub async fn exchange_code(&self, code: &str, state: &str) -> Result<(String, TokenData), OAuthError> {
        let key = state_key(state);
        let pending: Option<PendingLogin> = get_json(self.store.as_ref(), &key).await?;
        let Some(pending) = pending else {
            warn!("Unknown or expired OAuth state: {}", state);
            return Err(OAuthError::InvalidState);
        };
        // whoever deletes the entry owns the login
        if !self.store.remove(&key).await? {
            warn!("OAuth state already consumed: {}", state);
            return Err(OAuthError::InvalidState);
        }

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token exchange failed: {} - {}", status, body);
            return Err(OAuthError::Exchange(format!("{} - {}", status, body)));
        }

        let token: TokenData = response
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(format!("invalid token response: {}", e)))?;

        self.tokens.store_token(&pending.user_id, &token).await?;
        info!("Successfully exchanged authorization code for token");
        Ok((pending.user_id, token))
    }
}
