use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::warn;

use crate::core::config::Config;
use crate::server::types::ApiResponse;

/// Liveness of the service and its queue.
async fn handle_health_request(State(config): State<Arc<Config>>) -> impl IntoResponse {
    match config.queue().health_check().await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::<()>::success(Some("UP".to_string())))),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(ApiResponse::error(e.to_string())))
        }
    }
}

pub(super) fn local_route(config: Arc<Config>) -> Router {
    Router::new().route("/health", get(handle_health_request)).with_state(config)
}
