use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::error::job::JobError;
use crate::server::types::ApiResponse;

/// Errors returned by the job routes, each bound to an HTTP status.
#[derive(Error, Debug)]
pub enum JobRouteError {
    #[error("Invalid job ID: {0}")]
    InvalidId(String),

    #[error("Invalid job kind: {0}")]
    InvalidKind(String),

    #[error("Invalid job status: {0}")]
    InvalidStatus(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job {0} can no longer be cancelled, it is {1}")]
    NotCancellable(String, String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl From<JobError> for JobRouteError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidKind(kind) => JobRouteError::InvalidKind(kind),
            JobError::JobNotFound { id } => JobRouteError::NotFound(id.to_string()),
            JobError::NotCancellable { id, status } => JobRouteError::NotCancellable(id.to_string(), status.to_string()),
            other => JobRouteError::ProcessingError(other.to_string()),
        }
    }
}

impl IntoResponse for JobRouteError {
    fn into_response(self) -> Response {
        let status = match &self {
            JobRouteError::InvalidId(_) | JobRouteError::InvalidKind(_) | JobRouteError::InvalidStatus(_) => {
                StatusCode::BAD_REQUEST
            }
            JobRouteError::NotFound(_) => StatusCode::NOT_FOUND,
            JobRouteError::NotCancellable(_, _) => StatusCode::CONFLICT,
            JobRouteError::ProcessingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ApiResponse::error(self.to_string()))).into_response()
    }
}
