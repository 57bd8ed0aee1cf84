use axum::response::Response;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::JobRouteError;

/// Represents a job identifier in API requests.
///
/// This struct is used to deserialize job IDs from incoming HTTP requests,
/// particularly in path parameters.
#[derive(Deserialize)]
pub struct JobId {
    /// The string representation of the job's UUID
    pub id: String,
}

/// Represents a standardized API response structure.
///
/// This struct provides a consistent format for all API responses, including
/// both successful operations and errors.
///
/// # Examples
/// ```
/// use orchestrator::server::types::ApiResponse;
/// let response: ApiResponse<()> = ApiResponse::success(None);
/// assert_eq!(response.success, true);
/// assert_eq!(response.message, None);
///
/// let response = ApiResponse::error("Invalid job ID".to_string());
/// assert_eq!(response.success, false);
/// assert_eq!(response.message, Some("Invalid job ID".to_string()));
/// ```
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T = ()> {
    /// Indicates if the operation was successful
    pub success: bool,
    /// Optional data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Optional message, typically used for error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse<()> {
    /// Creates an error response with the specified message.
    pub fn error(message: String) -> Self {
        Self { success: false, data: None, message: Some(message) }
    }
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with optional data and message.
    pub fn success_with_data(data: T, message: Option<String>) -> Self {
        Self { success: true, data: Some(data), message }
    }

    /// Creates a successful response with no data.
    pub fn success(message: Option<String>) -> Self {
        Self { success: true, data: None, message }
    }
}

/// Type alias for the result type used in job route handlers.
pub type JobRouteResult = Result<Response<axum::body::Body>, JobRouteError>;

/// Body of `POST /jobs`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubmitJobRequest {
    /// `review`, `local-train` or `remote-train`
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubmitJobResponse {
    pub id: Uuid,
}

/// Query string of `GET /jobs`
#[derive(Debug, Deserialize, Default)]
pub struct ListJobsQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}
