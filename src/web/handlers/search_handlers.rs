// src/web/handlers/search_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::SearchError;
use crate::pipeline::SearchPipeline;
use crate::store::{get_json, put_json, KvStore};
use crate::types::{SearchRequest, SearchTask, TaskStatus};
use crate::utils::current_timestamp;
use crate::web::types::*;

/// Finished and abandoned tasks are forgotten after a day
pub const TASK_TTL: Duration = Duration::from_secs(24 * 60 * 60);

fn task_key(task_id: &str) -> String {
    format!("search:task:{}", task_id)
}

fn validation_error(e: &SearchError) -> ApiError {
    api_error(
        Status::BadRequest,
        e.to_string(),
        e.error_code(),
        &[
            "Keywords must not be empty",
            "max_jobs must be between 1 and 100",
        ],
    )
}

fn busy_error() -> ApiError {
    api_error(
        Status::ServiceUnavailable,
        "Search service is shutting down",
        "SERVICE_UNAVAILABLE",
        &["Try again in a few moments"],
    )
}

async fn save_task(store: &dyn KvStore, task: &SearchTask) -> anyhow::Result<()> {
    put_json(store, &task_key(&task.task_id), task, Some(TASK_TTL)).await
}

pub async fn search_handler(
    request: Json<SearchRequest>,
    state: &State<ServerState>,
) -> Result<Json<JobSearchResponse>, ApiError> {
    let request = request.into_inner();
    info!(
        "Job search request: {} in {}",
        request.keywords, request.location
    );
    if let Err(e) = request.validate() {
        warn!("Rejected search request: {}", e);
        return Err(validation_error(&e));
    }

    let _permit = state
        .search_permits
        .acquire()
        .await
        .map_err(|_| busy_error())?;

    match state.pipeline.run(&request).await {
        Ok(outcome) => Ok(Json(JobSearchResponse::from_outcome(outcome, request))),
        Err(e) => {
            warn!("Rejected search request: {}", e);
            Err(validation_error(&e))
        }
    }
}

async fn run_search_task(
    pipeline: Arc<SearchPipeline>,
    store: Arc<dyn KvStore>,
    permits: Arc<Semaphore>,
    mut task: SearchTask,
) {
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            task.status = TaskStatus::Failed;
            task.error = Some(e.to_string());
            if let Err(e) = save_task(store.as_ref(), &task).await {
                error!("Failed to record task {}: {:#}", task.task_id, e);
            }
            return;
        }
    };

    task.status = TaskStatus::Running;
    task.timestamp = current_timestamp();
    if let Err(e) = save_task(store.as_ref(), &task).await {
        warn!("Failed to mark task {} running: {:#}", task.task_id, e);
    }

    match pipeline.run(&task.request).await {
        Ok(outcome) => {
            info!("Background search {} found {} jobs", task.task_id, outcome.jobs_found);
            task.status = TaskStatus::Completed;
            task.result = Some(outcome);
        }
        Err(e) => {
            error!("Background search {} failed: {}", task.task_id, e);
            task.status = TaskStatus::Failed;
            task.error = Some(e.to_string());
        }
    }

    task.timestamp = current_timestamp();
    if let Err(e) = save_task(store.as_ref(), &task).await {
        error!("Failed to record task {}: {:#}", task.task_id, e);
    }
}

pub async fn search_async_handler(
    request: Json<SearchRequest>,
    state: &State<ServerState>,
) -> Result<Json<AsyncSearchResponse>, ApiError> {
    let request = request.into_inner();
    request.validate().map_err(|e| validation_error(&e))?;

    let task_id = uuid::Uuid::new_v4().to_string();
    let task = SearchTask {
        task_id: task_id.clone(),
        status: TaskStatus::Started,
        timestamp: current_timestamp(),
        request,
        result: None,
        error: None,
    };

    if let Err(e) = save_task(state.store.as_ref(), &task).await {
        error!("Failed to store task {}: {:#}", task_id, e);
        return Err(api_error(
            Status::InternalServerError,
            "Failed to start background search",
            "STORAGE_ERROR",
            &["Try again in a few moments"],
        ));
    }

    tokio::spawn(run_search_task(
        Arc::clone(&state.pipeline),
        Arc::clone(&state.store),
        Arc::clone(&state.search_permits),
        task,
    ));

    info!("Started background search task: {}", task_id);
    Ok(Json(AsyncSearchResponse {
        status_url: format!("/search/status/{}", task_id),
        task_id,
        status: TaskStatus::Started,
        message: "Job search started in background".to_string(),
    }))
}

pub async fn search_status_handler(
    task_id: &str,
    state: &State<ServerState>,
) -> Result<Json<SearchTask>, ApiError> {
    let task: Option<SearchTask> = get_json(state.store.as_ref(), &task_key(task_id))
        .await
        .map_err(|e| {
            error!("Failed to read task {}: {:#}", task_id, e);
            api_error(
                Status::InternalServerError,
                "Failed to read task status",
                "STORAGE_ERROR",
                &["Try again in a few moments"],
            )
        })?;

    task.map(Json).ok_or_else(|| {
        api_error(
            Status::NotFound,
            "Task not found",
            "TASK_NOT_FOUND",
            &["Task ids expire after 24 hours", "Start a new search with POST /search/async"],
        )
    })
}
