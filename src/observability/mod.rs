//! # Observability Module
//!
//! Structured logging and the Prometheus exporter.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::install_exporter;
