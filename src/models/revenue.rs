use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated revenue for one property, as computed by a revenue provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RevenueSummary {
    pub property_id: String,
    pub total: Decimal,
    pub currency: String,
    pub count: i64,
}

/// Response body of `GET /dashboard/summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub property_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub currency: String,
    pub reservations_count: i64,
}

impl From<RevenueSummary> for DashboardSummary {
    fn from(summary: RevenueSummary) -> Self {
        Self {
            property_id: summary.property_id,
            total_revenue: summary.total,
            currency: summary.currency,
            reservations_count: summary.count,
        }
    }
}
