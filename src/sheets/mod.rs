// src/sheets/mod.rs
//! Spreadsheet export with URL-based deduplication.

pub mod google;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{error, info};

use crate::types::{ExportResult, JobListing, SpreadsheetInfo};
use crate::utils::truncate_text;

pub use google::GoogleSheetsClient;
pub use memory::MemorySheets;

pub const SHEET_NAME: &str = "Job Listings";
pub const HEADER_RANGE: &str = "Job Listings!A1:L1";
pub const URL_COLUMN_RANGE: &str = "Job Listings!D:D";
pub const DATA_RANGE: &str = "Job Listings!A:L";

pub const HEADERS: [&str; 12] = [
    "Job Title",
    "Company",
    "Location",
    "Job URL",
    "Posted Date",
    "Employment Type",
    "Experience Level",
    "Salary Range",
    "Match Score",
    "Matching Requirements",
    "Description",
    "Date Added",
];

pub const MAX_DESCRIPTION_CHARS: usize = 1000;

#[async_trait]
pub trait SpreadsheetBackend: Send + Sync {
    /// Create a spreadsheet with a header row, returning its id
    async fn create_sheet(&self, title: &str) -> Result<String>;

    async fn read_column(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<String>>;

    /// Append rows after the last data row, returning the updated cell count
    async fn append_rows(&self, spreadsheet_id: &str, rows: Vec<Vec<String>>) -> Result<u64>;

    async fn get_metadata(&self, spreadsheet_id: &str) -> Result<SpreadsheetInfo>;

    fn sheet_url(&self, spreadsheet_id: &str) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}", spreadsheet_id)
    }
}

/// URLs already present in the sheet, header row excluded
pub async fn existing_job_urls(
    backend: &dyn SpreadsheetBackend,
    spreadsheet_id: &str,
) -> Result<HashSet<String>> {
    let column = backend.read_column(spreadsheet_id, URL_COLUMN_RANGE).await?;
    let urls: HashSet<String> = column
        .into_iter()
        .skip(1)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();

    info!("Found {} existing job URLs", urls.len());
    Ok(urls)
}

/// Drop jobs whose URL is already in `existing` or earlier in the batch.
/// Placeholder URLs never count as duplicates.
pub fn filter_new_jobs(jobs: Vec<JobListing>, existing: &HashSet<String>) -> Vec<JobListing> {
    let total = jobs.len();
    let mut seen = HashSet::new();

    let fresh: Vec<JobListing> = jobs
        .into_iter()
        .filter(|job| {
            if !job.has_real_url() {
                return true;
            }
            let url = job.job_url.trim();
            !existing.contains(url) && seen.insert(url.to_string())
        })
        .collect();

    info!("Filtered {} jobs down to {} new jobs", total, fresh.len());
    fresh
}

pub fn job_to_row(job: &JobListing, date_added: &str) -> Vec<String> {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    vec![
        job.title.clone(),
        job.company.clone(),
        job.location.clone(),
        job.job_url.clone(),
        text(&job.posted_date),
        text(&job.employment_type),
        text(&job.experience_level),
        text(&job.salary_range),
        job.match_score
            .map(|score| format!("{:.2}", score))
            .unwrap_or_default(),
        job.matches.join(", "),
        truncate_text(&job.description, MAX_DESCRIPTION_CHARS, "..."),
        date_added.to_string(),
    ]
}

async fn try_export(
    backend: &dyn SpreadsheetBackend,
    jobs: &[JobListing],
    spreadsheet_id: &str,
    filter_duplicates: bool,
) -> Result<ExportResult> {
    let jobs = if filter_duplicates {
        let existing = existing_job_urls(backend, spreadsheet_id).await?;
        filter_new_jobs(jobs.to_vec(), &existing)
    } else {
        jobs.to_vec()
    };

    let url = backend.sheet_url(spreadsheet_id);
    if jobs.is_empty() {
        return Ok(ExportResult::added(0, url));
    }

    let date_added = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let rows: Vec<Vec<String>> = jobs.iter().map(|job| job_to_row(job, &date_added)).collect();
    let row_count = rows.len();

    let updated_cells = backend.append_rows(spreadsheet_id, rows).await?;
    info!(
        "Added {} jobs to spreadsheet ({} cells updated)",
        row_count, updated_cells
    );

    Ok(ExportResult::added(row_count, url))
}

/// Append `jobs` to the sheet. Backend failures come back as a failed result.
pub async fn export_jobs(
    backend: &dyn SpreadsheetBackend,
    jobs: &[JobListing],
    spreadsheet_id: &str,
    filter_duplicates: bool,
) -> ExportResult {
    match try_export(backend, jobs, spreadsheet_id, filter_duplicates).await {
        Ok(result) => result,
        Err(e) => {
            error!("Failed to add jobs to spreadsheet {}: {:#}", spreadsheet_id, e);
            ExportResult::failed(format!("{:#}", e))
        }
    }
}
