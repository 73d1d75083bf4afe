//! # Cache-Aside Orchestrator
//!
//! Resolves a value either from the cache store or from a producer (normally
//! an upstream provider call), populating the store after a miss.
//!
//! - No store configured: the producer runs and its result is returned as is.
//! - Hit: the stored bytes are deserialized and returned; the producer does not run.
//! - Miss: the producer runs. `Ok` values are serialized and written with the
//!   caller's TTL; `Err` values are returned untouched and nothing is written.
//!
//! An entry that fails to deserialize, a failed or timed-out read, and a
//! failed write are all store failures. They are logged and treated as a miss
//! (or as "not cached this round"); they never reach the caller.
//!
//! Concurrent misses on the same key each run the producer unless
//! `coalesce_misses` is set, in which case they queue on a per-key lock and
//! re-read the store once the first producer has finished.

use super::stores::CacheStore;
use super::{CacheError, CacheResult};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct CacheAsideConfig {
    /// Deadline for a single store read or write
    pub operation_timeout: Duration,

    /// Serialize concurrent misses for the same key
    pub coalesce_misses: bool,
}

impl Default for CacheAsideConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(1),
            coalesce_misses: false,
        }
    }
}

/// A flow's claim on a per-key coalescing lock.
///
/// Released on drop, so a flow cancelled while waiting or producing still
/// gives its slot back.
struct InFlightSlot<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InFlightSlot<'a> {
    fn acquire(map: &'a DashMap<String, Arc<Mutex<()>>>, key: &'a str) -> Self {
        let lock = map.entry(key.to_string()).or_default().value().clone();
        Self { map, key, lock }
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        // Remove the slot once only the map and this flow hold it.
        self.map.remove_if(self.key, |_, slot| {
            Arc::ptr_eq(slot, &self.lock) && Arc::strong_count(slot) == 2
        });
    }
}

/// Cache-aside orchestrator over an optional store
pub struct CacheAside {
    store: Option<Arc<dyn CacheStore>>,
    config: CacheAsideConfig,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl CacheAside {
    /// Create an orchestrator. `None` means caching is disabled.
    pub fn new(store: Option<Arc<dyn CacheStore>>, config: CacheAsideConfig) -> Self {
        Self {
            store,
            config,
            in_flight: DashMap::new(),
        }
    }

    /// Orchestrator with no store; every call goes to the producer
    pub fn disabled() -> Self {
        Self::new(None, CacheAsideConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// The configured store, if any
    pub fn store(&self) -> Option<&Arc<dyn CacheStore>> {
        self.store.as_ref()
    }

    /// Return the cached value for `key`, or run `producer` and cache its result for `ttl`.
    pub async fn fetch_or_populate<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(store) = self.store.as_deref() else {
            return producer().await;
        };

        if let Some(value) = self.lookup(store, key).await {
            return Ok(value);
        }

        if self.config.coalesce_misses {
            return self.populate_coalesced(store, key, ttl, producer).await;
        }

        self.populate(store, key, ttl, producer).await
    }

    /// Read and decode `key`; any failure is a miss
    async fn lookup<T: DeserializeOwned>(&self, store: &dyn CacheStore, key: &str) -> Option<T> {
        match self.read(store, key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    metrics::counter!("catalog_cache_hits_total").increment(1);
                    debug!("Cache hit for key: {}", key);
                    Some(value)
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                debug!("Cache miss for key: {}", key);
                None
            }
            Err(e) => {
                metrics::counter!("catalog_cache_store_errors_total").increment(1);
                warn!(backend = store.backend_name(), "Cache read failed for key {}: {}", key, e);
                None
            }
        }
    }

    /// Run the producer and write its value back. Counts one miss.
    async fn populate<T, E, F, Fut>(
        &self,
        store: &dyn CacheStore,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        metrics::counter!("catalog_cache_misses_total").increment(1);
        let value = producer().await?;

        match self.store_value(store, key, &value, ttl).await {
            Ok(()) => debug!("Cached key: {} with TTL: {:?}", key, ttl),
            Err(e) => {
                metrics::counter!("catalog_cache_store_errors_total").increment(1);
                warn!(backend = store.backend_name(), "Cache write failed for key {}: {}", key, e);
            }
        }

        Ok(value)
    }

    async fn populate_coalesced<T, E, F, Fut>(
        &self,
        store: &dyn CacheStore,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let slot = InFlightSlot::acquire(&self.in_flight, key);
        let _guard = slot.lock.lock().await;

        match self.lookup(store, key).await {
            Some(value) => Ok(value),
            None => self.populate(store, key, ttl, producer).await,
        }
    }

    async fn store_value<T: Serialize>(
        &self,
        store: &dyn CacheStore,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        tokio::time::timeout(self.config.operation_timeout, store.set(key, &bytes, ttl))
            .await
            .map_err(|_| CacheError::Timeout)?
    }

    async fn read(&self, store: &dyn CacheStore, key: &str) -> CacheResult<Option<Vec<u8>>> {
        tokio::time::timeout(self.config.operation_timeout, store.get(key))
            .await
            .map_err(|_| CacheError::Timeout)?
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}
