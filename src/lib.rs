//! LinkedIn job search with a fallback chain of scrapers, requirement
//! matching and export to Google Sheets.

pub mod cli;
pub mod environment;
pub mod error;
pub mod oauth;
pub mod pipeline;
pub mod search;
pub mod sheets;
pub mod store;
pub mod types;
pub mod utils;
pub mod web;

pub use environment::AppConfig;
pub use error::{OAuthError, SearchError};
pub use pipeline::SearchPipeline;
pub use search::{JobSearchService, SearchStrategy};
pub use types::{JobListing, SearchOutcome, SearchRequest};
pub use web::{build_rocket, start_web_server, ServerState};
