// Revenue summary providers: Postgres aggregation and a read-through cache in front of it

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::database::{DatabaseError, DatabaseService, KeyValueCache, StoreError};
use crate::models::{RevenueSummary, TenantId};

const REVENUE_SUMMARY_SQL: &str = r#"
    SELECT p.id AS property_id,
           TRIM(p.currency)::text AS currency,
           COALESCE(SUM(r.total_amount), 0)::numeric AS total,
           COUNT(r.id) AS count
    FROM properties p
    LEFT JOIN reservations r
        ON r.tenant_id = p.tenant_id
       AND r.property_id = p.id
    WHERE p.tenant_id = $1
      AND p.id = $2
    GROUP BY p.id, p.currency
"#;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Property '{property_id}' not found")]
    PropertyNotFound { property_id: String },

    #[error("Revenue data unavailable: {0}")]
    Unavailable(String),

    #[error("Revenue aggregation failed: {0}")]
    Internal(String),
}

impl From<DatabaseError> for ProviderError {
    fn from(err: DatabaseError) -> Self {
        match StoreError::from(err) {
            StoreError::Unavailable(reason) => ProviderError::Unavailable(reason),
            StoreError::Query(reason) => ProviderError::Internal(reason),
        }
    }
}

impl From<sqlx::Error> for ProviderError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

/// Computes revenue figures for one of a tenant's properties.
/// Implementations must scope the computation to `tenant_id`.
#[async_trait]
pub trait RevenueSummaryProvider: Send + Sync {
    async fn get_revenue_summary(
        &self,
        property_id: &str,
        tenant_id: &TenantId,
    ) -> Result<RevenueSummary, ProviderError>;
}

/// Cache key for a tenant's property summary. The tenant is length-prefixed
/// so that `("acme", "east:prop")` and `("acme:east", "prop")` never collide.
pub fn cache_key(tenant_id: &TenantId, property_id: &str) -> String {
    format!("revenue:{}:{}:{}", tenant_id.as_str().len(), tenant_id, property_id)
}

/// Aggregates reservations in Postgres inside a tenant-scoped transaction
#[derive(Debug, Clone)]
pub struct PgRevenueAggregator {
    database: DatabaseService,
}

impl PgRevenueAggregator {
    pub fn new(database: DatabaseService) -> Self {
        Self { database }
    }
}

#[async_trait]
impl RevenueSummaryProvider for PgRevenueAggregator {
    async fn get_revenue_summary(
        &self,
        property_id: &str,
        tenant_id: &TenantId,
    ) -> Result<RevenueSummary, ProviderError> {
        let tenant: String = tenant_id.as_str().to_owned();
        let property: String = property_id.to_owned();

        let row: Option<RevenueSummary> = self
            .database
            .with_tenant(tenant_id, move |tx| Box::pin(async move {
                sqlx::query_as::<_, RevenueSummary>(REVENUE_SUMMARY_SQL)
                    .bind(tenant)
                    .bind(property)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(ProviderError::from)
            }))
            .await?;

        row.ok_or_else(|| ProviderError::PropertyNotFound {
            property_id: property_id.to_owned(),
        })
    }
}

/// Read-through cache in front of another provider. Cache failures are
/// logged and never fail the request.
#[derive(Clone)]
pub struct CachedRevenueService {
    cache: Arc<dyn KeyValueCache>,
    source: Arc<dyn RevenueSummaryProvider>,
    ttl_seconds: u64,
}

impl CachedRevenueService {
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        source: Arc<dyn RevenueSummaryProvider>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            cache,
            source,
            ttl_seconds,
        }
    }

    async fn read_cache(&self, key: &str) -> Option<RevenueSummary> {
        match self.cache.get_value(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!("Discarding malformed cached revenue summary {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Revenue cache read failed for {}: {:#}", key, e);
                None
            }
        }
    }

    async fn write_cache(&self, key: &str, summary: &RevenueSummary) {
        let raw: String = match serde_json::to_string(summary) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize revenue summary for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.cache.set_value_ex(key, &raw, self.ttl_seconds).await {
            warn!("Failed to cache revenue summary {}: {:#}", key, e);
        }
    }
}

#[async_trait]
impl RevenueSummaryProvider for CachedRevenueService {
    #[instrument(name = "revenue_summary", skip(self, tenant_id), fields(tenant_id = %tenant_id))]
    async fn get_revenue_summary(
        &self,
        property_id: &str,
        tenant_id: &TenantId,
    ) -> Result<RevenueSummary, ProviderError> {
        let key: String = cache_key(tenant_id, property_id);

        if let Some(summary) = self.read_cache(&key).await {
            debug!("Revenue summary served from cache: {}", key);
            return Ok(summary);
        }

        let summary: RevenueSummary = self.source.get_revenue_summary(property_id, tenant_id).await?;
        self.write_cache(&key, &summary).await;

        debug!("Revenue summary computed from source: {}", key);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;

    use super::*;
    use crate::database::redis_manager::memory::InMemoryCache;

    /// Counts calls and returns a fixed summary
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RevenueSummaryProvider for CountingSource {
        async fn get_revenue_summary(
            &self,
            property_id: &str,
            _tenant_id: &TenantId,
        ) -> Result<RevenueSummary, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(summary(property_id, Decimal::new(245075, 2), 7))
        }
    }

    fn summary(property_id: &str, total: Decimal, count: i64) -> RevenueSummary {
        RevenueSummary {
            property_id: property_id.into(),
            total,
            currency: "USD".into(),
            count,
        }
    }

    fn tenant(raw: &str) -> TenantId {
        TenantId::parse(raw).unwrap()
    }

    fn service(cache: Arc<InMemoryCache>, source: Arc<CountingSource>) -> CachedRevenueService {
        CachedRevenueService::new(cache, source, 300)
    }

    #[test]
    fn cache_keys_are_tenant_scoped() {
        let a: TenantId = tenant("tenant-a");
        let b: TenantId = tenant("tenant-b");

        assert_eq!(cache_key(&a, "prop-001"), "revenue:8:tenant-a:prop-001");
        assert_ne!(cache_key(&a, "prop-001"), cache_key(&b, "prop-001"));
    }

    #[test]
    fn separators_in_ids_do_not_collide() {
        assert_ne!(
            cache_key(&tenant("acme"), "east:prop-001"),
            cache_key(&tenant("acme:east"), "prop-001")
        );
    }

    #[tokio::test]
    async fn cached_summary_skips_the_source() {
        let key: String = cache_key(&tenant("tenant-a"), "prop-001");
        let cached: String =
            serde_json::to_string(&summary("prop-001", Decimal::new(1000, 2), 1)).unwrap();
        let cache: Arc<InMemoryCache> = Arc::new(InMemoryCache::with_entry(&key, &cached));
        let source: Arc<CountingSource> = Arc::new(CountingSource::default());

        let result: RevenueSummary = service(cache, source.clone())
            .get_revenue_summary("prop-001", &tenant("tenant-a"))
            .await
            .unwrap();

        assert_eq!(result.total, Decimal::new(1000, 2));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn miss_reads_source_and_stores_with_ttl() {
        let cache: Arc<InMemoryCache> = Arc::new(InMemoryCache::default());
        let source: Arc<CountingSource> = Arc::new(CountingSource::default());
        let revenue: CachedRevenueService = service(cache.clone(), source.clone());

        let first: RevenueSummary = revenue
            .get_revenue_summary("prop-001", &tenant("tenant-a"))
            .await
            .unwrap();
        let second: RevenueSummary = revenue
            .get_revenue_summary("prop-001", &tenant("tenant-a"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let (raw, ttl) = cache.entry(&cache_key(&tenant("tenant-a"), "prop-001")).unwrap();
        assert_eq!(ttl, 300);
        assert_eq!(serde_json::from_str::<RevenueSummary>(&raw).unwrap(), first);
    }

    #[tokio::test]
    async fn cache_read_failure_falls_through_to_source() {
        let cache: Arc<InMemoryCache> = Arc::new(InMemoryCache {
            fail_reads: true,
            ..InMemoryCache::default()
        });
        let source: Arc<CountingSource> = Arc::new(CountingSource::default());

        let result: RevenueSummary = service(cache, source.clone())
            .get_revenue_summary("prop-001", &tenant("tenant-a"))
            .await
            .unwrap();

        assert_eq!(result.count, 7);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_write_failure_still_returns_summary() {
        let cache: Arc<InMemoryCache> = Arc::new(InMemoryCache {
            fail_writes: true,
            ..InMemoryCache::default()
        });
        let source: Arc<CountingSource> = Arc::new(CountingSource::default());

        let result: RevenueSummary = service(cache.clone(), source)
            .get_revenue_summary("prop-001", &tenant("tenant-a"))
            .await
            .unwrap();

        assert_eq!(result.total, Decimal::new(245075, 2));
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_cache_entry_is_replaced() {
        let key: String = cache_key(&tenant("tenant-a"), "prop-001");
        let cache: Arc<InMemoryCache> = Arc::new(InMemoryCache::with_entry(&key, "{not json"));
        let source: Arc<CountingSource> = Arc::new(CountingSource::default());

        let result: RevenueSummary = service(cache.clone(), source.clone())
            .get_revenue_summary("prop-001", &tenant("tenant-a"))
            .await
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let (raw, _) = cache.entry(&key).unwrap();
        assert_eq!(serde_json::from_str::<RevenueSummary>(&raw).unwrap(), result);
    }

    #[tokio::test]
    async fn source_errors_are_not_cached() {
        struct MissingSource;

        #[async_trait]
        impl RevenueSummaryProvider for MissingSource {
            async fn get_revenue_summary(
                &self,
                property_id: &str,
                _tenant_id: &TenantId,
            ) -> Result<RevenueSummary, ProviderError> {
                Err(ProviderError::PropertyNotFound { property_id: property_id.into() })
            }
        }

        let cache: Arc<InMemoryCache> = Arc::new(InMemoryCache::default());
        let revenue: CachedRevenueService =
            CachedRevenueService::new(cache.clone(), Arc::new(MissingSource), 300);

        let result = revenue.get_revenue_summary("prop-404", &tenant("tenant-a")).await;

        assert!(matches!(result, Err(ProviderError::PropertyNotFound { .. })));
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn database_errors_map_to_provider_errors() {
        assert!(matches!(
            ProviderError::from(DatabaseError::NotInitialized),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            ProviderError::from(sqlx::Error::PoolTimedOut),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            ProviderError::from(sqlx::Error::ColumnNotFound("total".into())),
            ProviderError::Internal(_)
        ));
    }
}
