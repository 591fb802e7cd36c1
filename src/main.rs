use anyhow::{Context, Result};
use clap::Parser;
use job_sheets::cli::{handle_command, Cli};
use job_sheets::environment::AppConfig;
use std::fs::OpenOptions;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE: &str = "/tmp/jobsheets.log";
const DEFAULT_LOG_FILTER: &str =
    "job_sheets=info,jobsheets=info,rocket::server=off,headless_chrome=warn,sqlx=warn,hyper=warn,reqwest=warn";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging first
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open(LOG_FILE)
        .with_context(|| format!("Failed to open log file {}", LOG_FILE))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let config = AppConfig::load()?;

    info!("Starting jobsheets {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());
    info!(
        "Browser scraping: {}",
        if config.browser.enabled { "enabled" } else { "disabled" }
    );

    handle_command(cli, config).await
}
