pub mod revenue;

pub use revenue::{CachedRevenueService, PgRevenueAggregator, ProviderError, RevenueSummaryProvider};
