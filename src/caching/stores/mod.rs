//! # Cache Stores Module
//!
//! The key-value capability the cache-aside orchestrator consumes, plus the
//! Redis and in-memory implementations of it.

pub mod memory;
pub mod redis_store;

pub use memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis_store::{RedisCache, RedisCacheConfig};

use super::CacheResult;
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// A stored payload with its expiry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The key this entry was written under
    pub key: String,

    /// Serialized value
    pub payload: Vec<u8>,

    /// Time-to-live the entry was written with
    pub ttl: Duration,

    /// When the entry was written
    pub created_at: Instant,
}

impl CacheEntry {
    /// Create a new cache entry
    pub fn new(key: impl Into<String>, payload: Vec<u8>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            payload,
            ttl,
            created_at: Instant::now(),
        }
    }

    /// Check if the entry is expired
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }

    /// Remaining lifetime, zero once expired
    pub fn remaining_ttl(&self) -> Duration {
        self.ttl.saturating_sub(self.created_at.elapsed())
    }
}

/// Trait for cache store implementations
///
/// `set` is atomic from the caller's point of view: a reader either sees the
/// previous value or the complete new one.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value in the cache with TTL
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Perform health check
    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
