//! Request authentication.
//!
//! An [`Authenticator`] turns request headers into a [`Principal`]. The
//! production implementation resolves bearer tokens against session
//! records stored under `session:<token>` in a [`KeyValueCache`] (Redis).

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;
use tracing::{debug, warn};

use crate::database::KeyValueCache;
use crate::models::Principal;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or malformed authorization header")]
    MissingCredentials,

    #[error("Invalid or expired session")]
    InvalidCredentials,

    #[error("Session backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;
}

/// Extract Bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value: &str = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token: &str = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

pub fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

/// Resolves bearer tokens to JSON session records
#[derive(Clone)]
pub struct SessionAuthenticator {
    sessions: Arc<dyn KeyValueCache>,
}

impl SessionAuthenticator {
    pub fn new(sessions: Arc<dyn KeyValueCache>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token: &str = extract_bearer_token(headers)?;

        let raw: String = self
            .sessions
            .get_value(&session_key(token))
            .await
            .map_err(|e| AuthError::Backend(format!("{e:#}")))?
            .ok_or(AuthError::InvalidCredentials)?;

        let principal: Principal = serde_json::from_str(&raw).map_err(|e| {
            warn!("Malformed session record: {}", e);
            AuthError::InvalidCredentials
        })?;

        debug!(user_id = %principal.user_id, "Session resolved");
        Ok(principal)
    }
}
