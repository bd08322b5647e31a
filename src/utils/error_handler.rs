// Global error handling for HTTP middleware layers

use axum::{
    BoxError,
    http::StatusCode,
    response::IntoResponse,
};
use std::error::Error;
// tower's error type for timeouts
use tower::timeout::error::Elapsed;

/// Maps layer errors to HTTP status codes
pub async fn handle_global_error(err: BoxError) -> impl IntoResponse {
    status_for_layer_error(&err)
}

fn status_for_layer_error(err: &BoxError) -> StatusCode {
    // 408 if the request took too long
    if err.is::<Elapsed>() || find_cause::<Elapsed>(&**err).is_some() {
        return StatusCode::REQUEST_TIMEOUT;
    }

    // Otherwise, 500
    tracing::error!("Unhandled layer error: {}", err);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Helper function to find specific error type in error chain
pub fn find_cause<T: Error + 'static>(err: &dyn Error) -> Option<&T> {
    let mut source: Option<&dyn Error> = err.source();

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}
