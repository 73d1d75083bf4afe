//! # Caching System Module
//!
//! Client-side cache-aside policy for the catalog gateway.
//!
//! ## Architecture
//! 1. **Cache Stores**: the [`CacheStore`] capability with Redis and in-memory
//!    implementations
//! 2. **Key Scheme**: deterministic keys per resource class ([`CacheKeyScheme`])
//! 3. **Cache-Aside**: [`CacheAside::fetch_or_populate`], which decides between
//!    the store and the upstream producer and populates the store on a miss
//!
//! Caching is strictly best-effort. Store failures are [`CacheError`] values
//! that the orchestrator logs and degrades to "miss" or "skip population";
//! they never fail a request.
//!
//! ## Usage Example
//! ```rust,ignore
//! let store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new(InMemoryCacheConfig::default()));
//! let cache = CacheAside::new(Some(store), CacheAsideConfig::default());
//! let keys = CacheKeyScheme::new("catalog");
//!
//! let trending: Vec<RawMediaItem> = cache
//!     .fetch_or_populate(&keys.trending_tv(), Duration::from_secs(3600), || provider.trending_series())
//!     .await?;
//! ```

pub mod cache_aside;
pub mod key_scheme;
pub mod stores;

pub use cache_aside::{CacheAside, CacheAsideConfig};
pub use key_scheme::CacheKeyScheme;
pub use stores::{CacheEntry, CacheStore, InMemoryCache, InMemoryCacheConfig, RedisCache, RedisCacheConfig};

/// Cache operation result
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache store error: {message}")]
    Store { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache operation timeout")]
    Timeout,

    #[error("Cache not available")]
    Unavailable,
}
