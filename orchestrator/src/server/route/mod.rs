use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use jobs::job_router;
use public::local_route;

use crate::core::config::Config;

pub(super) mod jobs;
pub(super) mod public;

/// Handles 404 Not Found responses for the application.
///
/// This handler is used as a fallback when no other routes match the request.
pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "The requested resource was not found")
}

pub(crate) fn server_router(config: Arc<Config>) -> Router {
    Router::new().merge(local_route(config.clone())).nest("/jobs", job_router(config)).fallback(handler_404)
}
