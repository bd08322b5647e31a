use std::sync::Arc;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use tracing::info;
use crate::config::environment::EnvironmentVariables;

/// String key/value store with expiring writes. Sessions and cached
/// revenue summaries are read through this seam.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// `None` when the key does not exist
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    async fn set_value_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub fn new(env: Arc<EnvironmentVariables>) -> Result<Self> {
        let client: Client = Client::open(env.redis_url.as_ref())
            .context("Failed to create Redis client")?;
        Ok(Self { client })
    }

    pub async fn initialize(&self) -> Result<()> {
        let mut conn: redis::aio::MultiplexedConnection = self.get_connection().await?;

        let _: () = redis::cmd("PING").query_async(&mut conn).await
            .context("Failed to ping Redis")?;

        info!("Redis connection established successfully");
        Ok(())
    }

    pub async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client.get_multiplexed_async_connection().await
            .context("Failed to get Redis multiplexed connection")
    }

    pub async fn shutdown(&self) {
        // Multiplexed connections are dropped with their owners.
        info!("Redis service shutdown (noop)");
    }
}

#[async_trait]
impl KeyValueCache for RedisService {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut conn: redis::aio::MultiplexedConnection = self.get_connection().await?;

        let value: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("Failed to read '{key}' from Redis"))?;

        Ok(value)
    }

    async fn set_value_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn: redis::aio::MultiplexedConnection = self.get_connection().await?;

        let _: () = conn
            .set_ex(key, value, ttl_seconds)
            .await
            .with_context(|| format!("Failed to write '{key}' to Redis"))?;

        Ok(())
    }
}
