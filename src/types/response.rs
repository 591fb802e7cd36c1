// src/types/response.rs
use serde::{Deserialize, Serialize};

/// Outcome of one export attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub success: bool,
    pub jobs_added: usize,
    pub spreadsheet_url: Option<String>,
    pub error: Option<String>,
    pub message: String,
}

impl ExportResult {
    pub fn added(jobs_added: usize, spreadsheet_url: String) -> Self {
        let message = if jobs_added == 0 {
            "No new jobs to add".to_string()
        } else {
            format!("Successfully added {} jobs to spreadsheet", jobs_added)
        };

        Self {
            success: true,
            jobs_added,
            spreadsheet_url: Some(spreadsheet_url),
            error: None,
            message,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            jobs_added: 0,
            spreadsheet_url: None,
            message: format!("Failed to add jobs to spreadsheet: {}", error),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub url: String,
    pub sheets: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Started,
    Running,
    Completed,
    Failed,
}

/// Summary of a finished search, stored on completed tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub jobs_found: usize,
    pub matching_jobs: usize,
    pub jobs_added_to_sheets: Option<usize>,
    pub spreadsheet_url: Option<String>,
    pub jobs: Vec<super::JobListing>,
}

impl SearchOutcome {
    pub fn summary(&self) -> String {
        let mut message = format!("Found {} jobs", self.jobs_found);
        if self.matching_jobs < self.jobs_found {
            message.push_str(&format!(", {} matching your requirements", self.matching_jobs));
        }
        if let Some(added) = self.jobs_added_to_sheets {
            message.push_str(&format!(", added {} new jobs to spreadsheet", added));
        }
        message
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTask {
    pub task_id: String,
    pub status: TaskStatus,
    pub timestamp: String,
    pub request: super::SearchRequest,
    pub result: Option<SearchOutcome>,
    pub error: Option<String>,
}
