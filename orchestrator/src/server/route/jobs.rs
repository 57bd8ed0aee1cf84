use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::super::error::JobRouteError;
use super::super::types::{ApiResponse, JobId, JobRouteResult, ListJobsQuery, SubmitJobRequest, SubmitJobResponse};
use crate::core::config::Config;
use crate::types::jobs::types::{JobStatus, JobType};
use crate::types::jobs::view::JobView;
use crate::worker::service::JobService;

fn parse_job_id(id: &str) -> Result<Uuid, JobRouteError> {
    Uuid::parse_str(id).map_err(|_| JobRouteError::InvalidId(id.to_string()))
}

/// Handles HTTP requests to submit a job.
///
/// # Errors
/// * `JobRouteError::InvalidKind` - If `kind` is not a known job kind, no job is created then
/// * `JobRouteError::ProcessingError` - If the job could not be stored or enqueued
#[instrument(skip(config, request), fields(kind = %request.kind))]
async fn handle_submit_job_request(
    State(config): State<Arc<Config>>,
    Json(request): Json<SubmitJobRequest>,
) -> JobRouteResult {
    match JobService::submit_job(&request.kind, request.payload, config).await {
        Ok(id) => {
            info!(job_id = %id, "Job submitted");
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::success_with_data(SubmitJobResponse { id }, Some(format!("Job {} submitted", id)))),
            )
                .into_response())
        }
        Err(e) => {
            error!(error = %e, "Failed to submit job");
            Err(e.into())
        }
    }
}

/// Handles HTTP requests to read a single job.
#[instrument(skip(config), fields(job_id = %id))]
async fn handle_get_job_request(Path(JobId { id }): Path<JobId>, State(config): State<Arc<Config>>) -> JobRouteResult {
    let job_id = parse_job_id(&id)?;
    let job = JobService::get_job_view(job_id, config).await?;
    Ok(Json(ApiResponse::<JobView>::success_with_data(job, None)).into_response())
}

/// Handles HTTP requests to list jobs, optionally filtered by `kind` and `status`.
#[instrument(skip(config))]
async fn handle_list_jobs_request(
    Query(query): Query<ListJobsQuery>,
    State(config): State<Arc<Config>>,
) -> JobRouteResult {
    let kind = query
        .kind
        .as_deref()
        .map(|kind| JobType::from_str(kind).map_err(|_| JobRouteError::InvalidKind(kind.to_string())))
        .transpose()?;
    let status = query
        .status
        .as_deref()
        .map(|status| JobStatus::from_str(status).map_err(|_| JobRouteError::InvalidStatus(status.to_string())))
        .transpose()?;

    let jobs = JobService::list_jobs(kind, status, query.limit, config).await?;
    info!(count = jobs.len(), "Listed jobs");
    Ok(Json(ApiResponse::<Vec<JobView>>::success_with_data(jobs, None)).into_response())
}

/// Handles HTTP requests to cancel a job.
///
/// # Errors
/// * `JobRouteError::NotCancellable` - If the job already finished
#[instrument(skip(config), fields(job_id = %id))]
async fn handle_cancel_job_request(
    Path(JobId { id }): Path<JobId>,
    State(config): State<Arc<Config>>,
) -> JobRouteResult {
    let job_id = parse_job_id(&id)?;
    match JobService::cancel_job(job_id, config).await {
        Ok(job) => {
            info!("Job cancelled");
            Ok(Json(ApiResponse::success_with_data(JobView::from(job), Some(format!("Job {} cancelled", id))))
                .into_response())
        }
        Err(e) => {
            error!(error = %e, "Failed to cancel job");
            Err(e.into())
        }
    }
}

/// Creates a router for job-related endpoints.
///
/// # Arguments
/// * `config` - Shared application configuration
///
/// # Returns
/// * `Router` - Configured router with all job endpoints
pub fn job_router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/", post(handle_submit_job_request).get(handle_list_jobs_request))
        .route("/:id", get(handle_get_job_request))
        .route("/:id/cancel", post(handle_cancel_job_request))
        .with_state(config)
}
