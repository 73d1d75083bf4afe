//! # Redis Cache Store
//!
//! Redis-backed cache store over a multiplexed `ConnectionManager`, with
//! bounded retries and reconnect on failure.

use super::CacheStore;
use crate::caching::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Redis cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Key prefix for all cache entries
    pub key_prefix: String,

    /// Maximum number of retries per operation
    pub max_retries: u32,

    /// Base delay between retries, multiplied by the attempt number
    pub retry_delay: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: String::new(),
            max_retries: 1,
            retry_delay: Duration::from_millis(50),
        }
    }
}

type RedisFuture<'a, T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send + 'a>>;

/// Redis cache implementation
pub struct RedisCache {
    config: RedisCacheConfig,

    /// Redis connection manager
    connection_manager: RwLock<ConnectionManager>,

    connection_errors: AtomicU64,
}

impl RedisCache {
    /// Connect to Redis
    pub async fn new(config: RedisCacheConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let connection_manager = ConnectionManager::new(client).await?;

        info!("Redis cache connected to {}", config.url);

        Ok(Self {
            config,
            connection_manager: RwLock::new(connection_manager),
            connection_errors: AtomicU64::new(0),
        })
    }

    /// Get the full cache key with prefix
    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Number of failed Redis round trips since startup
    pub fn connection_errors(&self) -> u64 {
        self.connection_errors.load(Ordering::Relaxed)
    }

    /// Execute a Redis operation with retry logic
    async fn execute_with_retry<F, T>(&self, operation: F) -> CacheResult<T>
    where
        F: for<'c> Fn(&'c mut ConnectionManager) -> RedisFuture<'c, T> + Send + Sync,
        T: Send,
    {
        let mut retries = 0;

        loop {
            // ConnectionManager is a cheap multiplexed handle
            let mut conn = self.connection_manager.read().await.clone();

            match operation(&mut conn).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    self.connection_errors.fetch_add(1, Ordering::Relaxed);

                    if retries >= self.config.max_retries {
                        return Err(CacheError::Redis(e));
                    }

                    warn!("Redis operation failed, retrying: {}", e);
                    retries += 1;
                    tokio::time::sleep(self.config.retry_delay * retries).await;

                    if let Err(reconnect_err) = self.reconnect().await {
                        warn!("Failed to reconnect to Redis: {}", reconnect_err);
                    }
                }
            }
        }
    }

    /// Reconnect to Redis
    async fn reconnect(&self) -> CacheResult<()> {
        let client = Client::open(self.config.url.as_str())?;
        let new_connection_manager = ConnectionManager::new(client).await?;

        *self.connection_manager.write().await = new_connection_manager;

        info!("Reconnected to Redis");
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let full_key = self.full_key(key);

        let value = self
            .execute_with_retry(|conn| {
                let full_key = full_key.clone();
                Box::pin(async move { conn.get::<_, Option<Vec<u8>>>(full_key).await })
            })
            .await?;

        debug!(hit = value.is_some(), "Redis lookup for key: {}", key);
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let full_key = self.full_key(key);
        // SETEX rejects a zero expiry
        let ttl_seconds = ttl.as_secs().max(1);

        self.execute_with_retry(|conn| {
            let full_key = full_key.clone();
            let value = value.to_vec();
            Box::pin(async move { conn.set_ex::<_, _, ()>(full_key, value, ttl_seconds).await })
        })
        .await?;

        debug!("Set Redis cache key: {} with TTL: {}s", key, ttl_seconds);
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let result = self
            .execute_with_retry(|conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(conn).await })
            })
            .await;

        Ok(matches!(result, Ok(response) if response == "PONG"))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
