// src/web/handlers/sheet_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use tracing::{error, info};

use crate::sheets::{existing_job_urls, SpreadsheetBackend};
use crate::types::CreateSpreadsheetRequest;
use crate::utils::current_timestamp;
use crate::web::types::*;

fn backend(state: &ServerState) -> Result<&Arc<dyn SpreadsheetBackend>, ApiError> {
    state.pipeline.sheets().ok_or_else(|| {
        api_error(
            Status::ServiceUnavailable,
            "Google Sheets is not configured",
            "SHEETS_UNAVAILABLE",
            &[
                "Set GOOGLE_CREDENTIALS_PATH to a service account key",
                "Share the spreadsheet with the service account email",
            ],
        )
    })
}

fn sheets_error(context: &str, e: anyhow::Error) -> ApiError {
    error!("{}: {:#}", context, e);
    api_error(
        Status::InternalServerError,
        format!("{}: {}", context, e),
        "SHEETS_ERROR",
        &["Check that the spreadsheet exists and is shared with the service account"],
    )
}

pub async fn create_spreadsheet_handler(
    request: Json<CreateSpreadsheetRequest>,
    state: &State<ServerState>,
) -> Result<Json<SpreadsheetResponse>, ApiError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(api_error(
            Status::BadRequest,
            "Invalid title: must not be empty",
            "VALIDATION_ERROR",
            &["Provide a spreadsheet title"],
        ));
    }

    let backend = backend(state)?;
    info!("Creating spreadsheet: {}", title);

    let spreadsheet_id = backend
        .create_sheet(title)
        .await
        .map_err(|e| sheets_error("Failed to create spreadsheet", e))?;
    let info = backend
        .get_metadata(&spreadsheet_id)
        .await
        .map_err(|e| sheets_error("Failed to get spreadsheet info", e))?;

    Ok(Json(SpreadsheetResponse {
        success: true,
        message: format!("Successfully created spreadsheet: {}", title),
        spreadsheet_id: Some(spreadsheet_id),
        spreadsheet_url: Some(info.url),
        title: Some(info.title),
        timestamp: current_timestamp(),
    }))
}

pub async fn spreadsheet_info_handler(
    spreadsheet_id: &str,
    state: &State<ServerState>,
) -> Result<Json<SpreadsheetInfoResponse>, ApiError> {
    let backend = backend(state)?;

    let info = backend
        .get_metadata(spreadsheet_id)
        .await
        .map_err(|e| sheets_error("Failed to get spreadsheet info", e))?;
    let existing = existing_job_urls(backend.as_ref(), spreadsheet_id)
        .await
        .map_err(|e| sheets_error("Failed to read existing jobs", e))?;

    Ok(Json(SpreadsheetInfoResponse {
        success: true,
        spreadsheet_id: spreadsheet_id.to_string(),
        title: info.title,
        url: info.url,
        sheets: info.sheets,
        existing_jobs_count: existing.len(),
        timestamp: current_timestamp(),
    }))
}
