// Service status handler

use serde_json::json;
use axum::{http::StatusCode, extract::State};

use crate::config::state::AppState;
use crate::utils::response_handler::HandlerResponse;
use tracing::{instrument, info};

/// Returns API status and dependency health
#[instrument(skip(state))]
pub async fn status_handler(
    State(state): State<AppState>,
) -> HandlerResponse {
    info!("Status endpoint called");

    let database: &str = if state.database.is_available() { "available" } else { "unavailable" };

    HandlerResponse::new(StatusCode::OK)
        .data(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "status": "healthy",
            "environment": &*state.environment.environment,
            "database": database
        }))
        .message("API is running successfully")
}
