// src/pipeline.rs
//! Search followed by an optional spreadsheet export. Shared by the API and the CLI.

use std::sync::Arc;
use tracing::{info, warn};

use crate::environment::AppConfig;
use crate::error::SearchError;
use crate::search::JobSearchService;
use crate::sheets::{export_jobs, GoogleSheetsClient, SpreadsheetBackend};
use crate::types::{SearchOutcome, SearchRequest};

pub struct SearchPipeline {
    search: JobSearchService,
    sheets: Option<Arc<dyn SpreadsheetBackend>>,
}

impl SearchPipeline {
    pub fn new(search: JobSearchService, sheets: Option<Arc<dyn SpreadsheetBackend>>) -> Self {
        Self { search, sheets }
    }

    /// Strategy chain from config; export is available only when the
    /// service account credentials load.
    pub fn from_config(config: &AppConfig) -> Self {
        let sheets: Option<Arc<dyn SpreadsheetBackend>> =
            match GoogleSheetsClient::from_credentials_file(&config.google_credentials_path) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!("Google Sheets export disabled: {:#}", e);
                    None
                }
            };
        Self::new(JobSearchService::from_config(config), sheets)
    }

    pub fn sheets(&self) -> Option<&Arc<dyn SpreadsheetBackend>> {
        self.sheets.as_ref()
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.search.strategy_names()
    }

    /// Export happens only when the request names a spreadsheet, and its
    /// failure never fails the search.
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let jobs = self.search.search(request).await?;
        let matching_jobs = jobs.iter().filter(|j| j.is_match.unwrap_or(true)).count();

        let mut jobs_added_to_sheets = None;
        let mut spreadsheet_url = None;

        let spreadsheet_id = request
            .spreadsheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        if let Some(spreadsheet_id) = spreadsheet_id {
            match &self.sheets {
                Some(backend) => {
                    info!("Adding jobs to spreadsheet: {}", spreadsheet_id);
                    let result = export_jobs(
                        backend.as_ref(),
                        &jobs,
                        spreadsheet_id,
                        request.filter_duplicates,
                    )
                    .await;

                    if result.success {
                        jobs_added_to_sheets = Some(result.jobs_added);
                        spreadsheet_url = result.spreadsheet_url;
                    } else {
                        warn!(
                            "Failed to add jobs to sheets: {}",
                            result.error.unwrap_or_default()
                        );
                    }
                }
                None => warn!("No spreadsheet backend configured, skipping export"),
            }
        }

        Ok(SearchOutcome {
            jobs_found: jobs.len(),
            matching_jobs,
            jobs_added_to_sheets,
            spreadsheet_url,
            jobs,
        })
    }
}
