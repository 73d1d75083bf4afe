//! # Metrics
//!
//! Counters are recorded through the `metrics` facade at the call sites;
//! this module installs the Prometheus exporter that serves them.
//!
//! | Counter | Incremented when |
//! |---------|------------------|
//! | `catalog_cache_hits_total` | a stored entry is decoded and returned |
//! | `catalog_cache_misses_total` | the producer is invoked with a cache configured (once per miss, coalesced or not) |
//! | `catalog_cache_store_errors_total` | a store read or write fails or times out |
//! | `catalog_upstream_calls_total` | an upstream HTTP request is sent |
//! | `catalog_upstream_errors_total` | an upstream call fails or exceeds its deadline |

use crate::core::error::{GatewayError, GatewayResult};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Serve `/metrics` on `bind_address:port`. Port 0 disables the exporter.
pub fn install_exporter(bind_address: &str, port: u16) -> GatewayResult<()> {
    if port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .map_err(|e| GatewayError::config(format!("Invalid metrics address: {}", e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| GatewayError::internal(format!("Failed to install metrics exporter: {}", e)))?;

    info!("Prometheus metrics exported on {}", addr);
    Ok(())
}
