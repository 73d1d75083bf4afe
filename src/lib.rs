//! # Catalog Gateway - Core Library Crate
//!
//! A read-through HTTP gateway in front of a media catalog API. Each request
//! is answered from a cache when possible, otherwise fetched from the
//! upstream provider, stored with a per-resource TTL and projected into a
//! stable public schema.
//!
//! ## Module Layout
//!
//! - [`core`]: error type and configuration
//! - [`caching`]: key scheme, cache stores and the cache-aside orchestrator
//! - [`provider`]: the upstream capability and its HTTP implementation
//! - [`projection`]: raw upstream records to response shapes, links
//! - [`gateway`]: Axum handlers, router and server
//! - [`observability`]: logging and the Prometheus exporter
//!
//! The cache is strictly best-effort: a broken or absent store only costs
//! latency, never a failed request.

/// Error types and configuration
pub mod core;

/// Cache-aside orchestration over pluggable stores
pub mod caching;

/// Upstream catalog provider
pub mod provider;

/// Response projection
pub mod projection;

/// HTTP handlers and server
pub mod gateway;

/// Logging and metrics export
pub mod observability;

pub use caching::{CacheAside, CacheKeyScheme, CacheStore};
pub use core::config::GatewayConfig;
pub use core::error::{GatewayError, GatewayResult};
pub use gateway::{create_router, AppState, GatewayServer};
