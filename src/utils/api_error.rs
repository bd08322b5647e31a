// Handler-level errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::api::middleware::auth::AuthError;
use crate::models::identity::MissingTenant;
use crate::services::ProviderError;
use crate::utils::response_handler::HandlerResponse;

/// `data` of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: &'static str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required: {reason}")]
    Unauthenticated { reason: String },

    #[error("No tenant context available")]
    Forbidden,

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, independent of the message text
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated { .. } => "unauthenticated",
            ApiError::Forbidden => "missing_tenant",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::NotFound { .. } => "not_found",
            ApiError::ServiceUnavailable => "service_unavailable",
            ApiError::Internal => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        HandlerResponse::new(self.status_code())
            .message(self.to_string())
            .payload(&ErrorPayload { error: self.error_code() })
            .into_response()
    }
}

impl From<MissingTenant> for ApiError {
    fn from(_: MissingTenant) -> Self {
        ApiError::Forbidden
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Backend(reason) => {
                tracing::error!("Session backend failure: {}", reason);
                ApiError::ServiceUnavailable
            }
            other => ApiError::Unauthenticated {
                reason: other.to_string(),
            },
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::PropertyNotFound { .. } => ApiError::NotFound {
                message: err.to_string(),
            },
            ProviderError::Unavailable(reason) => {
                tracing::error!("Revenue provider unavailable: {}", reason);
                ApiError::ServiceUnavailable
            }
            ProviderError::Internal(reason) => {
                tracing::error!("Revenue provider failed: {}", reason);
                ApiError::Internal
            }
        }
    }
}
