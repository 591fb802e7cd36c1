// src/cli.rs
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::environment::AppConfig;
use crate::pipeline::SearchPipeline;
use crate::sheets::{existing_job_urls, SpreadsheetBackend};
use crate::types::SearchRequest;
use crate::utils::{format_job_for_display, parse_job_requirements, validate_spreadsheet_id};
use crate::web::start_web_server;

#[derive(Parser)]
#[command(name = "jobsheets")]
#[command(about = "Search LinkedIn jobs and collect them in Google Sheets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one search and print the results
    Search(SearchArgs),
    /// Create a spreadsheet with the job listing headers
    CreateSheet {
        #[arg(long)]
        title: String,
    },
    /// Show spreadsheet metadata and how many jobs it already holds
    SheetInfo {
        /// Defaults to GOOGLE_SPREADSHEET_ID
        #[arg(long)]
        spreadsheet_id: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(long)]
    pub keywords: String,
    #[arg(long, default_value = "")]
    pub location: String,
    /// Repeatable, one requirement per flag
    #[arg(long = "requirement")]
    pub requirement: Vec<String>,
    /// Free text list separated by commas, semicolons or newlines
    #[arg(long)]
    pub requirements: Option<String>,
    /// Defaults to max_jobs_per_search from config
    #[arg(long)]
    pub max_jobs: Option<usize>,
    #[arg(long, default_value = "")]
    pub experience_level: String,
    #[arg(long, default_value = "")]
    pub employment_type: String,
    #[arg(long, default_value = "")]
    pub date_posted: String,
    #[arg(long)]
    pub spreadsheet_id: Option<String>,
    /// Export to GOOGLE_SPREADSHEET_ID when no --spreadsheet-id is given
    #[arg(long)]
    pub export: bool,
    #[arg(long)]
    pub no_filter_duplicates: bool,
    /// Print a readable listing instead of JSON
    #[arg(long)]
    pub text: bool,
}

impl SearchArgs {
    pub fn into_request(self, config: &AppConfig) -> SearchRequest {
        let mut requirements = self.requirement;
        if let Some(text) = &self.requirements {
            requirements.extend(parse_job_requirements(text));
        }

        let spreadsheet_id = self.spreadsheet_id.or_else(|| {
            if self.export {
                config.google_spreadsheet_id.clone()
            } else {
                None
            }
        });

        SearchRequest {
            keywords: self.keywords,
            location: self.location,
            requirements,
            max_jobs: self.max_jobs.unwrap_or(config.max_jobs_per_search),
            experience_level: self.experience_level,
            employment_type: self.employment_type,
            date_posted: self.date_posted,
            spreadsheet_id,
            filter_duplicates: !self.no_filter_duplicates,
        }
    }
}

fn require_sheets(pipeline: &SearchPipeline) -> Result<&dyn SpreadsheetBackend> {
    pipeline
        .sheets()
        .map(|backend| backend.as_ref())
        .context("Google Sheets is not configured (check GOOGLE_CREDENTIALS_PATH)")
}

pub async fn handle_command(cli: Cli, mut config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            start_web_server(config).await
        }

        Command::Search(args) => {
            let text = args.text;
            let request = args.into_request(&config);
            let pipeline = SearchPipeline::from_config(&config);
            info!(
                "CLI search: {} in {} via {}",
                request.keywords,
                request.location,
                pipeline.strategy_names().join(" -> ")
            );

            let outcome = pipeline.run(&request).await?;

            if text {
                println!("{}", outcome.summary());
                for job in &outcome.jobs {
                    println!();
                    println!("{}", format_job_for_display(job, true));
                }
                if let Some(url) = &outcome.spreadsheet_url {
                    println!();
                    println!("Spreadsheet: {}", url);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            Ok(())
        }

        Command::CreateSheet { title } => {
            let title = title.trim();
            if title.is_empty() {
                anyhow::bail!("Spreadsheet title must not be empty");
            }

            let pipeline = SearchPipeline::from_config(&config);
            let backend = require_sheets(&pipeline)?;
            let spreadsheet_id = backend.create_sheet(title).await?;

            println!("✅ Spreadsheet created: {}", title);
            println!("   ID:  {}", spreadsheet_id);
            println!("   URL: {}", backend.sheet_url(&spreadsheet_id));
            Ok(())
        }

        Command::SheetInfo { spreadsheet_id } => {
            let spreadsheet_id = spreadsheet_id
                .or_else(|| config.google_spreadsheet_id.clone())
                .context("No spreadsheet id given and GOOGLE_SPREADSHEET_ID is not set")?;
            if !validate_spreadsheet_id(&spreadsheet_id) {
                anyhow::bail!("Invalid spreadsheet id: {}", spreadsheet_id);
            }

            let pipeline = SearchPipeline::from_config(&config);
            let backend = require_sheets(&pipeline)?;
            let info = backend.get_metadata(&spreadsheet_id).await?;
            let existing = existing_job_urls(backend, &spreadsheet_id).await?;

            println!("{}", info.title);
            println!("   URL:    {}", info.url);
            println!("   Sheets: {}", info.sheets.join(", "));
            println!("   Jobs:   {}", existing.len());
            Ok(())
        }
    }
}
