// src/types/mod.rs
pub mod job;
pub mod request;
pub mod response;

pub use job::{JobListing, JobSource, MatchResult, PLACEHOLDER_URL};
pub use request::{CreateSpreadsheetRequest, SearchRequest, DEFAULT_MAX_JOBS, MAX_JOBS_LIMIT};
pub use response::{
    ExportResult, SearchOutcome, SearchTask, SpreadsheetInfo, TaskStatus,
};
