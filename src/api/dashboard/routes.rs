// Dashboard route definitions

use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Router,
};

use crate::api::middleware::tenant::require_tenant_caller;
use crate::config::state::AppState;
use super::handler;

/// Creates router with the tenant-scoped dashboard endpoints
pub fn dashboard_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard/properties", get(handler::list_properties_handler))
        .route("/dashboard/summary", get(handler::summary_handler))
        .route_layer(from_fn_with_state(state, require_tenant_caller))
}
