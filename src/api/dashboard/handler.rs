// Dashboard handlers: tenant property listing and revenue summary

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::config::state::AppState;
use crate::database::StoreError;
use crate::models::{CallerIdentity, DashboardSummary, Property, RevenueSummary, TenantId};
use crate::utils::response_handler::HandlerResponse;
use crate::utils::ApiError;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub property_id: Option<String>,
}

/// Lists the caller's tenant properties ordered by name
#[instrument(name = "list_properties", skip(state, caller), fields(tenant_id = %caller.tenant_id))]
pub async fn list_properties_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<HandlerResponse, ApiError> {
    let properties: Vec<Property> = load_properties(&state, &caller.tenant_id).await?;

    info!("Returning {} properties", properties.len());

    Ok(HandlerResponse::new(StatusCode::OK)
        .payload(&properties)
        .message("Properties retrieved successfully"))
}

/// Reads from the property store, degrading to the static fallback table on failure
pub async fn load_properties(state: &AppState, tenant_id: &TenantId) -> Result<Vec<Property>, ApiError> {
    let err: StoreError = match state.properties.list_properties(tenant_id).await {
        Ok(properties) => return Ok(properties),
        Err(err) => err,
    };

    match err {
        StoreError::Unavailable(reason) => {
            warn!("Property store unavailable for tenant {}, using fallback data: {}", tenant_id, reason);
        }
        StoreError::Query(reason) if !state.environment.fallback_on_query_error => {
            error!("Property query failed for tenant {}: {}", tenant_id, reason);
            return Err(ApiError::Internal);
        }
        StoreError::Query(reason) => {
            error!("Property query failed for tenant {}, using fallback data: {}", tenant_id, reason);
        }
    }

    Ok(state.fallback.for_tenant(tenant_id))
}

/// Revenue summary for one of the caller's properties
#[instrument(name = "dashboard_summary", skip(state, caller, query), fields(tenant_id = %caller.tenant_id))]
pub async fn summary_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(query): Query<SummaryQuery>,
) -> Result<HandlerResponse, ApiError> {
    let property_id: String = query
        .property_id
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("property_id query parameter is required"))?;

    let revenue: RevenueSummary = state
        .revenue
        .get_revenue_summary(&property_id, &caller.tenant_id)
        .await?;

    let summary: DashboardSummary = revenue.into();

    Ok(HandlerResponse::new(StatusCode::OK)
        .payload(&summary)
        .message("Revenue summary retrieved successfully"))
}
