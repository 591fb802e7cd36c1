// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::search::browser::{BrowserConfig, DEFAULT_USER_AGENT};

pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Off on hosts without Chrome; the chain then starts at the HTTP scraper
    pub enabled: bool,
    pub headless: bool,
    pub user_agent: String,
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInOAuthSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: String,
}

impl Default for LinkedInOAuthSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://localhost:8000/auth/linkedin/callback".to_string(),
            scopes: "r_liteprofile,r_emailaddress".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub google_credentials_path: PathBuf,
    pub google_spreadsheet_id: Option<String>,
    pub browser: BrowserSettings,
    pub job_search_timeout: u64,
    pub max_concurrent_searches: usize,
    pub max_jobs_per_search: usize,
    pub database_path: PathBuf,
    pub port: u16,
    pub linkedin: LinkedInOAuthSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_credentials_path: PathBuf::from("credentials.json"),
            google_spreadsheet_id: None,
            browser: BrowserSettings::default(),
            job_search_timeout: 30,
            max_concurrent_searches: 3,
            max_jobs_per_search: 25,
            database_path: PathBuf::from("data/jobsheets.db"),
            port: 8000,
            linkedin: LinkedInOAuthSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: AppConfig,
    #[serde(default)]
    production: AppConfig,
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e)),
        None => Ok(None),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

impl AppConfig {
    /// Load configuration based on environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let mut config = Self::load_from_file(Path::new(CONFIG_FILE), &environment)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.database_path = Self::resolve_path(&config.database_path)?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("JOBSHEETS_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// A missing file means defaults; a malformed one is an error
    pub fn load_from_file(path: &Path, environment: &str) -> Result<Self> {
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content, environment)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(content)?;
        Ok(match environment {
            "production" => config_file.production,
            _ => config_file.local,
        })
    }

    /// Apply per-key overrides. Empty values are treated as unset.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = lookup("GOOGLE_CREDENTIALS_PATH") {
            self.google_credentials_path = PathBuf::from(path);
        }
        if let Some(id) = lookup("GOOGLE_SPREADSHEET_ID") {
            self.google_spreadsheet_id = Some(id);
        }
        if let Some(headless) = lookup("CHROME_HEADLESS") {
            self.browser.headless = parse_flag(&headless);
        }
        if let Some(enabled) = lookup("CHROME_ENABLED") {
            self.browser.enabled = parse_flag(&enabled);
        }
        if let Some(user_agent) = lookup("CHROME_USER_AGENT") {
            self.browser.user_agent = user_agent;
        }
        if let Some(path) = lookup("CHROME_PATH") {
            self.browser.chrome_path = Some(PathBuf::from(path));
        }
        if let Some(timeout) = parse_var(&lookup, "JOB_SEARCH_TIMEOUT")? {
            self.job_search_timeout = timeout;
        }
        if let Some(max) = parse_var(&lookup, "MAX_CONCURRENT_SEARCHES")? {
            self.max_concurrent_searches = max;
        }
        if let Some(max) = parse_var(&lookup, "MAX_JOBS_PER_SEARCH")? {
            self.max_jobs_per_search = max;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(port) = parse_var(&lookup, "ROCKET_PORT")? {
            self.port = port;
        }
        if let Some(id) = lookup("LINKEDIN_CLIENT_ID") {
            self.linkedin.client_id = Some(id);
        }
        if let Some(secret) = lookup("LINKEDIN_CLIENT_SECRET") {
            self.linkedin.client_secret = Some(secret);
        }
        if let Some(uri) = lookup("LINKEDIN_REDIRECT_URI") {
            self.linkedin.redirect_uri = uri;
        }
        if let Some(scopes) = lookup("LINKEDIN_OAUTH_SCOPES") {
            self.linkedin.scopes = scopes;
        }

        if self.max_concurrent_searches == 0 {
            anyhow::bail!("MAX_CONCURRENT_SEARCHES must be at least 1");
        }
        Ok(())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            headless: self.browser.headless,
            user_agent: self.browser.user_agent.clone(),
            timeout: Duration::from_secs(self.job_search_timeout),
            chrome_path: self.browser.chrome_path.clone(),
        }
    }

    pub fn oauth_enabled(&self) -> bool {
        self.linkedin.client_id.is_some() && self.linkedin.client_secret.is_some()
    }

    pub fn credentials_present(&self) -> bool {
        self.google_credentials_path.exists()
    }

    /// Ensure the database directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        if let Some(db_parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(db_parent)
                .await
                .with_context(|| {
                    format!(
                        "Failed to create database directory: {}",
                        db_parent.display()
                    )
                })?;
        }
        Ok(())
    }
}
