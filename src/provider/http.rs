//! HTTP/JSON client for the upstream catalog API.

use super::{
    RawDetail, RawMediaItem, RawSearchPage, RawStreamResult, StreamServer, UpstreamProvider,
};
use crate::core::config::UpstreamConfig;
use crate::core::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

/// Upstream provider backed by a JSON HTTP API
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: Url,
}

impl HttpProvider {
    /// Build a provider from configuration
    pub fn new(config: &UpstreamConfig) -> GatewayResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| GatewayError::config(format!("Invalid upstream base_url: {}", e)))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// `base_url` with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::config("Upstream base_url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> GatewayResult<T> {
        metrics::counter!("catalog_upstream_calls_total").increment(1);
        debug!("Upstream request: {}", url);

        let result = async {
            let response = self.client.get(url.clone()).query(query).send().await?;
            let response = response.error_for_status()?;
            Ok::<T, reqwest::Error>(response.json::<T>().await?)
        }
        .await;

        result.map_err(|e| {
            metrics::counter!("catalog_upstream_errors_total").increment(1);
            warn!("Upstream request to {} failed: {}", url.path(), e);
            GatewayError::from(e)
        })
    }
}

#[async_trait]
impl UpstreamProvider for HttpProvider {
    #[instrument(skip(self))]
    async fn trending_series(&self) -> GatewayResult<Vec<RawMediaItem>> {
        let url = self.endpoint(&["trending", "tv"])?;
        self.get_json(url, &[]).await
    }

    #[instrument(skip(self))]
    async fn trending_movies(&self) -> GatewayResult<Vec<RawMediaItem>> {
        let url = self.endpoint(&["trending", "movies"])?;
        self.get_json(url, &[]).await
    }

    #[instrument(skip(self))]
    async fn detail(&self, id: &str) -> GatewayResult<RawDetail> {
        let url = self.endpoint(&["info"])?;
        self.get_json(url, &[("id", id)]).await
    }

    #[instrument(skip(self))]
    async fn stream_sources(
        &self,
        episode_id: &str,
        media_id: &str,
        server: Option<StreamServer>,
    ) -> GatewayResult<RawStreamResult> {
        let url = self.endpoint(&["watch"])?;
        let mut query = vec![("episodeId", episode_id), ("mediaId", media_id)];
        if let Some(server) = server {
            query.push(("server", server.as_str()));
        }
        self.get_json(url, &query).await
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, page: u32) -> GatewayResult<RawSearchPage> {
        let url = self.endpoint(&["search", query])?;
        let page = page.to_string();
        self.get_json(url, &[("page", page.as_str())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider(base_url: &str) -> HttpProvider {
        HttpProvider::new(&UpstreamConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let provider = provider("http://upstream:3000/movies/flixhq/");
        let url = provider.endpoint(&["search", "the office"]).unwrap();
        assert_eq!(url.as_str(), "http://upstream:3000/movies/flixhq/search/the%20office");
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let provider = provider("http://upstream:3000");
        let url = provider.endpoint(&["trending", "tv"]).unwrap();
        assert_eq!(url.as_str(), "http://upstream:3000/trending/tv");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = HttpProvider::new(&UpstreamConfig {
            base_url: "::not a url".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(GatewayError::Configuration { .. })));
    }
}
