//! # HTTP Server Module
//!
//! Wires the catalog handlers into an Axum router and runs it.
//!
//! ## Rust Concepts Used
//!
//! - `Arc<T>` for sharing the cache and provider across requests
//! - `async/await` for non-blocking I/O operations
//! - `tokio::net::TcpListener` for accepting incoming connections
//! - Tower middleware for request tracing

use super::handlers;
use crate::caching::{
    CacheAside, CacheAsideConfig, CacheKeyScheme, CacheStore, InMemoryCache, InMemoryCacheConfig,
    RedisCache, RedisCacheConfig,
};
use crate::core::config::{CacheBackend, CacheConfig, GatewayConfig, TtlPolicy};
use crate::core::error::{GatewayError, GatewayResult};
use crate::projection::links::LinkBuilder;
use crate::provider::UpstreamProvider;
use axum::http::{header, HeaderMap};
use axum::{routing::get, Router as AxumRouter};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheAside>,
    pub provider: Arc<dyn UpstreamProvider>,
    pub keys: CacheKeyScheme,
    pub ttl: TtlPolicy,

    /// Base for generated links; falls back to the request `Host`
    pub public_url: Option<String>,

    /// Deadline for every producer call
    pub upstream_timeout: Duration,

    /// Deadline for the store probe in `/health`
    pub cache_probe_timeout: Duration,
}

impl AppState {
    /// State with caching disabled and default TTLs
    pub fn new(provider: Arc<dyn UpstreamProvider>) -> Self {
        Self {
            cache: Arc::new(CacheAside::disabled()),
            provider,
            keys: CacheKeyScheme::default(),
            ttl: TtlPolicy::default(),
            public_url: None,
            upstream_timeout: Duration::from_secs(15),
            cache_probe_timeout: Duration::from_secs(1),
        }
    }

    /// State built from configuration and an already constructed store
    pub fn from_config(
        config: &GatewayConfig,
        store: Option<Arc<dyn CacheStore>>,
        provider: Arc<dyn UpstreamProvider>,
    ) -> Self {
        let cache_config = config.cache.clone().unwrap_or_default();

        let cache = CacheAside::new(
            store,
            CacheAsideConfig {
                operation_timeout: cache_config.operation_timeout,
                coalesce_misses: cache_config.coalesce_misses,
            },
        );

        Self {
            cache: Arc::new(cache),
            provider,
            keys: CacheKeyScheme::new(cache_config.namespace),
            ttl: cache_config.ttl,
            public_url: config.server.public_url.clone(),
            upstream_timeout: config.upstream.timeout,
            cache_probe_timeout: cache_config.operation_timeout,
        }
    }

    pub fn with_cache(mut self, cache: CacheAside) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        self.public_url = Some(public_url.into());
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Run an upstream call under the configured deadline
    pub async fn with_deadline<T, F>(&self, call: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        match tokio::time::timeout(self.upstream_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                metrics::counter!("catalog_upstream_errors_total").increment(1);
                warn!("Upstream call exceeded {:?}", self.upstream_timeout);
                Err(GatewayError::Timeout {
                    timeout_ms: self.upstream_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Link builder for one request
    pub fn links(&self, headers: &HeaderMap) -> LinkBuilder {
        if let Some(public_url) = &self.public_url {
            return LinkBuilder::new(public_url.as_str());
        }

        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .filter(|host| !host.is_empty())
            .unwrap_or("localhost");

        LinkBuilder::new(format!("http://{}", host))
    }
}

/// Build the catalog router over `state`
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/main", get(handlers::trending))
        .route("/info", get(handlers::info))
        .route("/watch", get(handlers::watch))
        .route("/search/:query", get(handlers::search))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Construct the configured cache store, if any.
///
/// An unreachable Redis at startup is a deployment error and fails the boot;
/// once running, store failures degrade to misses.
pub async fn build_cache_store(
    config: Option<&CacheConfig>,
) -> GatewayResult<Option<Arc<dyn CacheStore>>> {
    let Some(config) = config else {
        info!("Caching disabled; every request goes to the upstream");
        return Ok(None);
    };

    let store: Arc<dyn CacheStore> = match &config.backend {
        CacheBackend::Redis(redis) => {
            let store = RedisCache::new(RedisCacheConfig {
                url: redis.url.clone(),
                key_prefix: redis.key_prefix.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| GatewayError::config(format!("Failed to connect cache store: {}", e)))?;
            Arc::new(store)
        }
        CacheBackend::Memory(memory) => Arc::new(InMemoryCache::new(InMemoryCacheConfig {
            max_entries: memory.max_entries,
        })),
    };

    info!(
        "Cache enabled: backend={}, namespace={}",
        store.backend_name(),
        config.namespace
    );
    Ok(Some(store))
}

/// HTTP server for the catalog gateway
pub struct GatewayServer {
    bind_addr: String,
    app: AxumRouter,
}

impl GatewayServer {
    pub fn new(config: &GatewayConfig, state: AppState) -> Self {
        Self {
            bind_addr: config.server.listen_addr(),
            app: create_router(state),
        }
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    /// Serve until `shutdown` resolves
    pub async fn start<S>(self, shutdown: S) -> GatewayResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.bind_addr).await.map_err(|e| {
            GatewayError::internal(format!("Failed to bind server to {}: {}", self.bind_addr, e))
        })?;

        let local_addr: SocketAddr = listener.local_addr()?;
        info!("Catalog gateway listening on {}", local_addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::internal(format!("Server error: {}", e)))?;

        info!("Catalog gateway stopped");
        Ok(())
    }
}
