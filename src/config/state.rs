// Application state shared by every request

use std::sync::Arc;
use crate::api::middleware::auth::{Authenticator, SessionAuthenticator};
use crate::config::environment::EnvironmentVariables;
use crate::config::fallback::FallbackProperties;
use crate::database::{DatabaseService, KeyValueCache, PgPropertyStore, PropertyStore, RedisService};
use crate::services::{CachedRevenueService, PgRevenueAggregator, RevenueSummaryProvider};

/// Immutable after construction; cloning only bumps reference counts
#[derive(Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub database: DatabaseService,
    pub redis: RedisService,
    pub authenticator: Arc<dyn Authenticator>,
    pub properties: Arc<dyn PropertyStore>,
    pub revenue: Arc<dyn RevenueSummaryProvider>,
    pub fallback: Arc<FallbackProperties>,
}

impl AppState {
    /// Wires the production collaborators. Nothing connects yet; see `initialize`.
    pub fn new(environment: Arc<EnvironmentVariables>) -> anyhow::Result<Self> {
        // Create services
        let database: DatabaseService = DatabaseService::new(environment.clone());
        let redis: RedisService = RedisService::new(environment.clone())?;
        let fallback: FallbackProperties =
            FallbackProperties::load(environment.fallback_properties_file.as_deref())?;

        let cache: Arc<dyn KeyValueCache> = Arc::new(redis.clone());

        Ok(Self {
            authenticator: Arc::new(SessionAuthenticator::new(cache.clone())),
            properties: Arc::new(PgPropertyStore::new(database.clone())),
            revenue: Arc::new(CachedRevenueService::new(
                cache,
                Arc::new(PgRevenueAggregator::new(database.clone())),
                environment.revenue_cache_ttl_seconds,
            )),
            fallback: Arc::new(fallback),
            environment,
            database,
            redis,
        })
    }

    /// Builds state from the process environment. Invalid values are
    /// returned as errors instead of aborting the process.
    pub fn from_environment() -> anyhow::Result<Self> {
        Self::new(Arc::new(EnvironmentVariables::instance()?.clone()))
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    pub fn with_property_store(mut self, properties: Arc<dyn PropertyStore>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_revenue_provider(mut self, revenue: Arc<dyn RevenueSummaryProvider>) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackProperties) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }

    /// Connects to Postgres and Redis. Failures are logged, not fatal:
    /// property listing degrades to fallback data while the database is down.
    pub async fn initialize(&self) {
        match self.database.initialize().await {
            Ok(()) => tracing::info!("Database ready"),
            Err(e) => tracing::warn!("Database unavailable at startup, serving fallback data: {:#}", e),
        }

        match self.redis.initialize().await {
            Ok(()) => tracing::info!("Redis ready"),
            Err(e) => tracing::warn!("Redis unavailable at startup: {:#}", e),
        }
    }

    /// Gracefully shutdown all connections
    pub async fn shutdown(&self) {
        self.database.shutdown().await;
        self.redis.shutdown().await;
    }
}
