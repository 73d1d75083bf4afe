//! # Configuration Module
//!
//! This module holds the gateway configuration and its loading pipeline.
//!
//! ## Key Features
//! - YAML/JSON configuration parsing with serde
//! - Environment variable override support
//! - Comprehensive validation with detailed error messages
//!
//! The `cache` section is optional. When it is absent the gateway runs with no
//! cache store at all and every request goes straight to the upstream provider.

use crate::core::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main gateway configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration (ports, public URL)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream provider settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Cache settings; `None` disables caching entirely
    #[serde(default)]
    pub cache: Option<CacheConfig>,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            cache: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::config(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON
    pub async fn load_from_json<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: GatewayConfig = serde_json::from_str(&content)
            .map_err(|e| GatewayError::config(format!("Failed to parse JSON config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    ///
    /// Environment overrides and validation run in both cases.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                return Self::load_from_json(path).await;
            }
            return Self::load_from_file(path).await;
        }

        tracing::warn!("Config file {} not found, using defaults", path.display());
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Environment variables follow the pattern: GATEWAY_<SECTION>_<FIELD>
    /// For example: GATEWAY_SERVER_HTTP_PORT=8080
    pub fn apply_env_overrides(&mut self) -> GatewayResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub(crate) fn apply_overrides<F>(&mut self, var: F) -> GatewayResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = var("GATEWAY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }

        if let Some(port) = var("GATEWAY_SERVER_HTTP_PORT") {
            self.server.http_port = port
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_SERVER_HTTP_PORT: {}", e)))?;
        }

        if let Some(port) = var("GATEWAY_SERVER_METRICS_PORT") {
            self.server.metrics_port = port
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_SERVER_METRICS_PORT: {}", e)))?;
        }

        if let Some(url) = var("GATEWAY_SERVER_PUBLIC_URL") {
            self.server.public_url = Some(url);
        }

        if let Some(url) = var("GATEWAY_UPSTREAM_BASE_URL") {
            self.upstream.base_url = url;
        }

        if let Some(timeout) = var("GATEWAY_UPSTREAM_TIMEOUT") {
            self.upstream.timeout = humantime::parse_duration(&timeout)
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_UPSTREAM_TIMEOUT: {}", e)))?;
        }

        if let Some(url) = var("GATEWAY_REDIS_URL") {
            let cache = self.cache.get_or_insert_with(CacheConfig::default);
            match &mut cache.backend {
                CacheBackend::Redis(redis) => redis.url = url,
                backend => {
                    *backend = CacheBackend::Redis(RedisCacheConfig {
                        url,
                        ..RedisCacheConfig::default()
                    })
                }
            }
        }

        if let Some(disabled) = var("GATEWAY_CACHE_DISABLED") {
            let disabled: bool = disabled
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_CACHE_DISABLED: {}", e)))?;
            if disabled {
                self.cache = None;
            }
        }

        if let Some(level) = var("GATEWAY_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = var("GATEWAY_LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" => LogFormat::Text,
                other => {
                    return Err(GatewayError::config(format!(
                        "Invalid GATEWAY_LOG_FORMAT: {}",
                        other
                    )))
                }
            };
        }

        Ok(())
    }

    /// Comprehensive configuration validation with detailed error messages
    pub fn validate(&self) -> GatewayResult<()> {
        let mut errors = Vec::new();

        if self.server.http_port == 0 {
            errors.push("http_port must be greater than 0".to_string());
        }

        if self.server.bind_address.is_empty() {
            errors.push("bind_address cannot be empty".to_string());
        }

        if let Some(public_url) = &self.server.public_url {
            if let Err(e) = Url::parse(public_url) {
                errors.push(format!("Invalid public_url '{}': {}", public_url, e));
            }
        }

        if let Err(e) = Url::parse(&self.upstream.base_url) {
            errors.push(format!("Invalid upstream base_url '{}': {}", self.upstream.base_url, e));
        }

        if self.upstream.timeout.is_zero() {
            errors.push("upstream timeout must be greater than 0".to_string());
        }

        if let Some(cache) = &self.cache {
            if cache.namespace.is_empty() {
                errors.push("cache namespace cannot be empty".to_string());
            }

            if cache.operation_timeout.is_zero() {
                errors.push("cache operation_timeout must be greater than 0".to_string());
            }

            for (name, ttl) in cache.ttl.entries() {
                if ttl.as_secs() == 0 {
                    errors.push(format!("cache ttl.{} must be at least 1s", name));
                }
            }

            match &cache.backend {
                CacheBackend::Redis(redis) => {
                    if !(redis.url.starts_with("redis://") || redis.url.starts_with("rediss://")) {
                        errors.push(format!(
                            "Redis url must start with redis:// or rediss://, got '{}'",
                            redis.url
                        ));
                    }
                }
                CacheBackend::Memory(memory) => {
                    if memory.max_entries == 0 {
                        errors.push("memory cache max_entries must be greater than 0".to_string());
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(GatewayError::config(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: String,

    /// HTTP port
    pub http_port: u16,

    /// Prometheus exporter port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,

    /// Externally visible base URL used for generated links.
    /// When unset, links are built from the request's `Host` header.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: 8080,
            metrics_port: 9090,
            public_url: None,
        }
    }
}

impl ServerConfig {
    /// Socket address string for the HTTP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.http_port)
    }
}

/// Upstream provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the upstream catalog API
    pub base_url: String,

    /// Deadline applied to every upstream call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Which store backs the cache
    pub backend: CacheBackend,

    /// First segment of every cache key
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Deadline for a single store round trip
    #[serde(with = "humantime_serde", default = "default_operation_timeout")]
    pub operation_timeout: Duration,

    /// Serialize concurrent misses for the same key behind one producer call
    #[serde(default)]
    pub coalesce_misses: bool,

    /// TTL per resource class
    #[serde(default)]
    pub ttl: TtlPolicy,
}

fn default_namespace() -> String {
    "catalog".to_string()
}

fn default_operation_timeout() -> Duration {
    Duration::from_secs(1)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis(RedisCacheConfig::default()),
            namespace: default_namespace(),
            operation_timeout: default_operation_timeout(),
            coalesce_misses: false,
            ttl: TtlPolicy::default(),
        }
    }
}

/// Cache store backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CacheBackend {
    Redis(RedisCacheConfig),
    Memory(MemoryCacheConfig),
}

/// Redis store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Prefix prepended to every key on the wire
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: String::new(),
        }
    }
}

/// In-process store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of live entries
    pub max_entries: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

/// Time-to-live for each resource class.
///
/// Trending lists churn over hours, stream URLs expire within tens of minutes,
/// and detail/search results are close to static.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlPolicy {
    #[serde(with = "humantime_serde")]
    pub trending: Duration,

    #[serde(with = "humantime_serde")]
    pub info: Duration,

    #[serde(with = "humantime_serde")]
    pub watch: Duration,

    #[serde(with = "humantime_serde")]
    pub search: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            trending: Duration::from_secs(3 * 60 * 60),
            info: Duration::from_secs(24 * 60 * 60),
            watch: Duration::from_secs(25 * 60),
            search: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl TtlPolicy {
    fn entries(&self) -> [(&'static str, Duration); 4] {
        [
            ("trending", self.trending),
            ("info", self.info),
            ("watch", self.watch),
            ("search", self.search),
        ]
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "catalog_gateway=info,tower_http=info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use tokio::fs;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config_validation() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_config_serialization_yaml() {
        let mut config = GatewayConfig::default();
        config.cache = Some(CacheConfig::default());
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: GatewayConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.server.http_port, deserialized.server.http_port);
        assert_eq!(
            deserialized.cache.unwrap().ttl.watch,
            Duration::from_secs(25 * 60)
        );
    }

    #[tokio::test]
    async fn test_load_config_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("gateway.yaml");

        let config_content = r#"
server:
  bind_address: "127.0.0.1"
  http_port: 9080
  public_url: "https://catalog.example.com"

upstream:
  base_url: "http://provider.internal:3000"
  timeout: "5s"

cache:
  backend:
    type: "Memory"
    max_entries: 500
  namespace: "media"
  coalesce_misses: true
  ttl:
    trending: "2h"
    info: "12h"
    watch: "20m"
    search: "1d"

logging:
  level: "debug"
  format: "text"
"#;

        fs::write(&config_path, config_content).await.unwrap();

        let config = GatewayConfig::load_from_file(&config_path).await.unwrap();

        assert_eq!(config.server.http_port, 9080);
        assert_eq!(config.server.public_url.as_deref(), Some("https://catalog.example.com"));
        assert_eq!(config.upstream.timeout, Duration::from_secs(5));
        let cache = config.cache.unwrap();
        assert_eq!(cache.namespace, "media");
        assert!(cache.coalesce_misses);
        assert_eq!(cache.operation_timeout, Duration::from_secs(1));
        assert_eq!(cache.ttl.watch, Duration::from_secs(20 * 60));
        assert!(matches!(cache.backend, CacheBackend::Memory(MemoryCacheConfig { max_entries: 500 })));
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[tokio::test]
    async fn test_missing_cache_section_disables_cache() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("gateway.yaml");
        fs::write(&config_path, "upstream:\n  base_url: \"http://localhost:4000\"\n  timeout: \"3s\"\n")
            .await
            .unwrap();

        let config = GatewayConfig::load_from_file(&config_path).await.unwrap();
        assert!(config.cache.is_none());
        assert_eq!(config.upstream.base_url, "http://localhost:4000");
    }

    #[tokio::test]
    async fn test_load_or_default_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = GatewayConfig::load_or_default(temp_dir.path().join("absent.yaml"))
            .await
            .unwrap();
        assert_eq!(config.server.http_port, 8080);
    }

    #[test]
    fn test_environment_variable_overrides() {
        let mut config = GatewayConfig::default();
        config
            .apply_overrides(vars(&[
                ("GATEWAY_SERVER_HTTP_PORT", "9999"),
                ("GATEWAY_UPSTREAM_TIMEOUT", "7s"),
                ("GATEWAY_REDIS_URL", "redis://cache:6379"),
                ("GATEWAY_LOG_FORMAT", "text"),
            ]))
            .unwrap();

        assert_eq!(config.server.http_port, 9999);
        assert_eq!(config.upstream.timeout, Duration::from_secs(7));
        assert_eq!(config.logging.format, LogFormat::Text);
        match config.cache.unwrap().backend {
            CacheBackend::Redis(redis) => assert_eq!(redis.url, "redis://cache:6379"),
            other => panic!("expected redis backend, got {:?}", other),
        }
    }

    #[test]
    fn test_cache_disabled_override_wins() {
        let mut config = GatewayConfig::default();
        config
            .apply_overrides(vars(&[
                ("GATEWAY_REDIS_URL", "redis://cache:6379"),
                ("GATEWAY_CACHE_DISABLED", "true"),
            ]))
            .unwrap();
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_invalid_environment_variables() {
        let mut config = GatewayConfig::default();
        let result = config.apply_overrides(vars(&[("GATEWAY_SERVER_HTTP_PORT", "not-a-port")]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("GATEWAY_SERVER_HTTP_PORT"));
    }

    #[test]
    fn test_config_validation_errors() {
        let mut config = GatewayConfig::default();
        config.server.http_port = 0;
        config.upstream.base_url = "not a url".to_string();
        config.cache = Some(CacheConfig {
            backend: CacheBackend::Redis(RedisCacheConfig {
                url: "http://wrong".to_string(),
                key_prefix: String::new(),
            }),
            namespace: String::new(),
            ttl: TtlPolicy {
                watch: Duration::from_millis(10),
                ..TtlPolicy::default()
            },
            ..CacheConfig::default()
        });

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("http_port must be greater than 0"));
        assert!(message.contains("Invalid upstream base_url"));
        assert!(message.contains("cache namespace cannot be empty"));
        assert!(message.contains("ttl.watch"));
        assert!(message.contains("Redis url must start with"));
    }
}
