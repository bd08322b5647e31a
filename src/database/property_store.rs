// Tenant-scoped property queries

use async_trait::async_trait;
use thiserror::Error;

use crate::database::postgres_service::{DatabaseError, DatabaseService};
use crate::models::{Property, TenantId};

const LIST_PROPERTIES_SQL: &str = r#"
    SELECT id, name
    FROM properties
    WHERE tenant_id = $1
    ORDER BY name
"#;

/// Why a store call failed. `Unavailable` means the store could not be
/// reached at all; `Query` means it answered with an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("property store unavailable: {0}")]
    Unavailable(String),

    #[error("property query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            // SQLSTATE class 08 (connection exception), 57P0x (shutdown), 53300 (too many connections)
            sqlx::Error::Database(db_err)
                if db_err
                    .code()
                    .is_some_and(|code| code.starts_with("08") || code.starts_with("57P0") || code == "53300") =>
            {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotInitialized => StoreError::Unavailable(err.to_string()),
            DatabaseError::Sqlx(sqlx_err) => sqlx_err.into(),
        }
    }
}

/// Read access to a tenant's properties.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Properties owned by `tenant_id`, ordered by name ascending
    async fn list_properties(&self, tenant_id: &TenantId) -> Result<Vec<Property>, StoreError>;
}

/// `PropertyStore` over the shared Postgres pool
#[derive(Debug, Clone)]
pub struct PgPropertyStore {
    database: DatabaseService,
}

impl PgPropertyStore {
    pub fn new(database: DatabaseService) -> Self {
        Self { database }
    }
}

#[async_trait]
impl PropertyStore for PgPropertyStore {
    async fn list_properties(&self, tenant_id: &TenantId) -> Result<Vec<Property>, StoreError> {
        let tenant: String = tenant_id.as_str().to_owned();

        self.database
            .with_tenant(tenant_id, move |tx| Box::pin(async move {
                sqlx::query_as::<_, Property>(LIST_PROPERTIES_SQL)
                    .bind(tenant)
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(StoreError::from)
            }))
            .await
    }
}
