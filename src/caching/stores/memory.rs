//! # In-Memory Cache Store
//!
//! Process-local cache store with TTL expiry and a bounded entry count.
//! Used for single-instance deployments and as the store in tests.

use super::{CacheEntry, CacheStore};
use crate::caching::CacheResult;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// In-memory cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

/// In-memory cache implementation
pub struct InMemoryCache {
    config: InMemoryCacheConfig,

    /// Cache entries storage
    entries: DashMap<String, CacheEntry>,

    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryCache {
    /// Create a new in-memory cache
    pub fn new(config: InMemoryCacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Number of stored entries, expired ones included until they are touched
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The TTL an entry was written with
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.get(key).map(|entry| entry.ttl)
    }

    /// (hits, misses, evictions)
    pub fn counters(&self) -> (u64, u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.evictions.load(Ordering::Relaxed),
        )
    }

    /// Make room for one more entry
    fn evict_if_full(&self) {
        if self.entries.len() < self.config.max_entries {
            return;
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let expired = before.saturating_sub(self.entries.len());
        if expired > 0 {
            debug!("Dropped {} expired cache entries", expired);
        }

        while self.entries.len() >= self.config.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.created_at)
                .map(|entry| entry.key().clone());

            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        // The shard guard must be released before remove_if takes it for writing.
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired()).then(|| entry.payload.clone()));

        let value = match lookup {
            Some(Some(payload)) => Some(payload),
            Some(None) => {
                self.entries.remove_if(key, |_, entry| entry.is_expired());
                None
            }
            None => None,
        };

        match value {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        if !self.entries.contains_key(key) {
            self.evict_if_full();
        }
        self.entries
            .insert(key.to_string(), CacheEntry::new(key, value.to_vec(), ttl));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
