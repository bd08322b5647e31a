// =============================================================================
// DATABASE SERVICE - Shared Schema, tenant-scoped transactions
// =============================================================================

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool, Executor, Postgres, Transaction};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, log::LevelFilter};

use crate::config::environment::EnvironmentVariables;
use crate::models::TenantId;

// =============================================================================
// SQL CONSTANTS
// =============================================================================

/// Single initialization SQL script
const INIT_SCHEMA_SQL: &str = include_str!("sql/schema_init.sql");

/// Sets the tenant for row-level security policies, scoped to the current transaction
const SET_TENANT_SQL: &str = "SELECT set_config('app.current_tenant_id', $1, true)";

// =============================================================================
// ERRORS
// =============================================================================

/// Failures raised by the service itself, before or around caller queries
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database pool not initialized")]
    NotInitialized,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Future returned by a tenant-scoped block
pub type ScopedFuture<'c, T, E> = Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'c>>;

// =============================================================================
// DATABASE SERVICE
// =============================================================================

/// Database service managing a single PostgreSQL connection pool.
/// Tenant isolation is enforced per transaction (see `with_tenant`).
#[derive(Clone, Debug)]
pub struct DatabaseService {
    /// Single connection pool for the application
    pool: Arc<OnceCell<PgPool>>,
    /// Environment configuration
    config: Arc<EnvironmentVariables>,
}

impl DatabaseService {
    /// Creates a new DatabaseService instance.
    /// Note: The pool is not initialized until `initialize()` is called.
    pub fn new(config: Arc<EnvironmentVariables>) -> Self {
        Self {
            pool: Arc::new(OnceCell::new()),
            config,
        }
    }

    /// Initializes the database service by creating the pool and running the schema script.
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing DatabaseService...");

        // Initialize the pool if not already initialized
        let pool: &PgPool = self.pool.get_or_try_init(|| async {
            self.create_pool().await
        }).await?;

        // Run schema initialization
        self.initialize_schema(pool).await?;

        info!("DatabaseService initialized successfully");
        Ok(())
    }

    /// Gracefully shuts down the service.
    pub async fn shutdown(&self) {
        info!("Initiating DatabaseService shutdown...");
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Database connection pool closed");
        } else {
            debug!("Database pool was not initialized, nothing to close");
        }
    }

    /// Returns the connection pool.
    /// Errors if the pool has not been initialized.
    pub fn get_pool(&self) -> std::result::Result<&PgPool, DatabaseError> {
        self.pool.get().ok_or(DatabaseError::NotInitialized)
    }

    /// True when the pool exists and has not been closed
    pub fn is_available(&self) -> bool {
        self.pool.get().is_some_and(|pool| !pool.is_closed())
    }
}

// =============================================================================
// SCOPED EXECUTION (Tenant Awareness)
// =============================================================================

impl DatabaseService {
    /// Executes a closure within a tenant-scoped transaction.
    /// `app.current_tenant_id` is set for the transaction before the block runs.
    /// The transaction is committed if the block returns Ok and rolled back otherwise;
    /// the connection goes back to the pool on every path.
    pub async fn with_tenant<F, T, E>(&self, tenant_id: &TenantId, block: F) -> std::result::Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> ScopedFuture<'c, T, E> + Send,
        E: From<DatabaseError>,
    {
        let pool: &PgPool = self.get_pool()?;
        let mut tx: Transaction<'static, Postgres> = pool
            .begin()
            .await
            .map_err(DatabaseError::from)?;

        // Inject Tenant Context
        sqlx::query(SET_TENANT_SQL)
            .bind(tenant_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        // Execute Business Logic
        match block(&mut tx).await {
            Ok(val) => {
                tx.commit().await.map_err(DatabaseError::from)?;
                Ok(val)
            }
            Err(e) => {
                // Rollback is automatic on drop; an explicit rollback releases the connection sooner
                if let Err(rollback_err) = tx.rollback().await {
                    debug!("Rollback after failed tenant block also failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

// =============================================================================
// INTERNAL HELPERS
// =============================================================================

impl DatabaseService {
    /// Creates the connection pool based on environment config
    async fn create_pool(&self) -> Result<PgPool> {
        let connect_options: PgConnectOptions = self.create_connect_options();

        let pool: PgPool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(self.config.default_timeout_seconds))
            .idle_timeout(std::time::Duration::from_secs(30))
            .connect_with(connect_options)
            .await
            .context("Failed to create database connection pool")?;

        Ok(pool)
    }

    /// Creates connection options with SSL and UTC timezone
    fn create_connect_options(&self) -> PgConnectOptions {
        let mut options: PgConnectOptions = PgConnectOptions::new()
            .host(&self.config.db_host)
            .port(self.config.db_port)
            .username(&self.config.db_user)
            .password(&self.config.db_password)
            .database(&self.config.db_name)
            .log_statements(LevelFilter::Debug);

        // Always use UTC and standard app name
        options = options.options([
            ("timezone", "UTC"),
            ("application_name", "property-dashboard-api")
        ]);

        // Configure SSL based on environment
        if self.config.environment == "development" {
            options.ssl_mode(sqlx::postgres::PgSslMode::Prefer)
        } else {
            options.ssl_mode(sqlx::postgres::PgSslMode::Require)
        }
    }

    /// Runs the initialization SQL
    async fn initialize_schema(&self, pool: &PgPool) -> Result<()> {
        info!("Executing schema initialization...");

        pool.execute(INIT_SCHEMA_SQL)
            .await
            .context("Failed to execute schema initialization SQL")?;

        info!("Schema initialization completed");
        Ok(())
    }
}
