use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::config::state::AppState;
use crate::models::{CallerIdentity, Principal};
use crate::utils::ApiError;

/// Middleware that authenticates the request and requires a tenant.
/// On success a `CallerIdentity` is stored in request extensions; otherwise
/// the request is rejected before any handler or data access runs.
pub async fn require_tenant_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Authenticate
    let principal: Principal = state.authenticator.authenticate(request.headers()).await?;

    // 2. Require a tenant
    let caller: CallerIdentity = CallerIdentity::try_from(principal).map_err(|e| {
        warn!("Rejecting request without tenant context: {}", e);
        ApiError::from(e)
    })?;

    debug!(tenant_id = %caller.tenant_id, user_id = %caller.user_id, "Tenant context established");

    // 3. Store in Request Extensions
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}
