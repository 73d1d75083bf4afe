//! # Error Handling
//!
//! Request-facing error type for the catalog gateway, built on `thiserror`.
//!
//! Every failure a handler can observe is a [`GatewayError`]. The variants fall
//! into three groups that decide what the caller sees:
//!
//! - **client errors** (missing or invalid parameters) become `400` with a
//!   specific message; they are raised before any cache or upstream call
//! - **unknown routes** become `404` with the fixed `page not found` body
//! - everything else (upstream failures, deadlines, configuration, decoding)
//!   becomes a `500` carrying one fixed generic message; the detail is logged,
//!   never sent to the caller
//!
//! Cache store failures are not represented here: they are
//! [`CacheError`](crate::caching::CacheError) values that the cache-aside
//! orchestrator degrades to a miss and never lets escape.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Main result type used throughout the gateway
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Message returned with every `500` response
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Error types for the catalog gateway
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// A required query or path parameter was missing or empty
    #[error("{param} is required")]
    MissingParameter { param: String },

    /// The `server` query parameter named an unknown streaming server
    #[error("Invalid server query")]
    InvalidServer { value: String },

    /// The `page` query parameter was not a positive integer
    #[error("Invalid page query")]
    InvalidPage { value: String },

    /// The query string or path could not be decoded
    #[error("{message}")]
    MalformedRequest { message: String },

    /// No route matched the request path
    #[error("page not found")]
    RouteNotFound { path: String },

    /// Any failure reported by the upstream provider (network, decode, not found)
    #[error("Upstream provider error: {message}")]
    Upstream { message: String },

    /// The upstream call did not complete within the configured deadline
    #[error("Upstream timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Configuration-related errors (invalid config, unreadable files, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Internal server errors for unexpected failures
    #[error("Internal server error: {message}")]
    Internal { message: String },

    /// I/O errors (file operations, socket binding, etc.)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },
}

impl GatewayError {
    /// Create a missing-parameter error for the named parameter
    pub fn missing<S: Into<String>>(param: S) -> Self {
        Self::MissingParameter {
            param: param.into(),
        }
    }

    /// Create an upstream error with a custom message
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code returned to the caller for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidServer { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidPage { .. } => StatusCode::BAD_REQUEST,
            Self::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Json { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Yaml { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error was caused by the request rather than the gateway
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Get a string representation of the error type for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } => "missing_parameter",
            Self::InvalidServer { .. } => "invalid_server",
            Self::InvalidPage { .. } => "invalid_page",
            Self::MalformedRequest { .. } => "malformed_request",
            Self::RouteNotFound { .. } => "route_not_found",
            Self::Upstream { .. } => "upstream_error",
            Self::Timeout { .. } => "timeout",
            Self::Configuration { .. } => "configuration_error",
            Self::Internal { .. } => "internal_error",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Yaml { .. } => "yaml_error",
        }
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Rejected query string: {}", rejection.body_text());
        Self::MalformedRequest {
            message: "Invalid query string".to_string(),
        }
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected path: {}", rejection.body_text());
        Self::MalformedRequest {
            message: "Invalid path".to_string(),
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for GatewayError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

/// Transport, status and decode failures all look the same to the core
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream {
            message: err.to_string(),
        }
    }
}

/// Render the public error body.
///
/// Client errors echo their message, unknown routes get the fixed 404 shape and
/// all other failures collapse to [`GENERIC_FAILURE_MESSAGE`].
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Self::RouteNotFound { .. } => json!({
                "message": "",
                "error": "page not found",
            }),
            err if err.is_client_error() => json!({ "message": err.to_string() }),
            err => {
                error!(error_type = err.error_type(), "Request failed: {}", err);
                json!({ "message": GENERIC_FAILURE_MESSAGE })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(GatewayError::missing("id").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::InvalidServer { value: "foo".to_string() }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::RouteNotFound { path: "/nope".to_string() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::upstream("connection refused").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Timeout { timeout_ms: 5000 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_error_messages() {
        assert_eq!(GatewayError::missing("episodeId").to_string(), "episodeId is required");
        assert_eq!(
            GatewayError::InvalidServer { value: "x".to_string() }.to_string(),
            "Invalid server query"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(GatewayError::missing("id").is_client_error());
        assert!(!GatewayError::upstream("boom").is_client_error());
        assert!(!GatewayError::RouteNotFound { path: "/".to_string() }.status_code().is_server_error());
    }

    #[test]
    fn test_malformed_request_is_client_error() {
        let err = GatewayError::MalformedRequest {
            message: "Invalid query string".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid query string");
    }
}
