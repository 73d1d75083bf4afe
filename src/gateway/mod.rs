//! # Gateway Module
//!
//! HTTP surface of the catalog gateway: handlers, router and server.

pub mod handlers;
pub mod server;

pub use server::{build_cache_store, create_router, AppState, GatewayServer};
