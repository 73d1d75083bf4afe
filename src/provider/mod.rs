//! # Upstream Provider
//!
//! The capability the gateway consumes to obtain catalog data, and the raw
//! record types it returns. Raw records mirror the upstream's loose JSON:
//! the media `type` is a free-form string and most fields are optional. They
//! are what the cache stores; the projector turns them into the public schema.
//!
//! Every provider failure (network, decoding, not found) is reported as
//! [`GatewayError::Upstream`] or [`GatewayError::Timeout`]; callers cannot tell
//! a missing item from an outage.

pub mod http;

pub use http::HttpProvider;

use crate::core::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One entry of a trending list or a search result page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMediaItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    /// Free text such as `"SS 3"`
    #[serde(default)]
    pub season: Option<String>,
    /// Free text such as `"EPS 12"`
    #[serde(default)]
    pub latest_episode: Option<String>,
}

/// Full record for a single movie or series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDetail {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    /// Upstream order is preserved
    #[serde(default)]
    pub episodes: Vec<RawEpisode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEpisode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub season: Option<u32>,
}

/// Candidate playback sources and subtitles for one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStreamResult {
    #[serde(default)]
    pub sources: Vec<RawSource>,
    #[serde(default)]
    pub subtitles: Vec<RawSubtitle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSource {
    pub url: String,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(rename = "isM3U8", default)]
    pub is_m3u8: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSubtitle {
    pub url: String,
    #[serde(default)]
    pub lang: String,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchPage {
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(alias = "results", default)]
    pub items: Vec<RawMediaItem>,
}

fn first_page() -> u32 {
    1
}

/// Streaming servers a caller may pin a stream lookup to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamServer {
    UpCloud,
    VidCloud,
    MixDrop,
}

impl StreamServer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpCloud => "upcloud",
            Self::VidCloud => "vidcloud",
            Self::MixDrop => "mixdrop",
        }
    }
}

impl fmt::Display for StreamServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamServer {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "upcloud" => Ok(Self::UpCloud),
            "vidcloud" => Ok(Self::VidCloud),
            "mixdrop" => Ok(Self::MixDrop),
            _ => Err(GatewayError::InvalidServer {
                value: value.to_string(),
            }),
        }
    }
}

/// Source of raw catalog data
#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    /// Currently trending series
    async fn trending_series(&self) -> GatewayResult<Vec<RawMediaItem>>;

    /// Currently trending movies
    async fn trending_movies(&self) -> GatewayResult<Vec<RawMediaItem>>;

    /// Full record for one movie or series
    async fn detail(&self, id: &str) -> GatewayResult<RawDetail>;

    /// Playback sources for one episode of a title
    async fn stream_sources(
        &self,
        episode_id: &str,
        media_id: &str,
        server: Option<StreamServer>,
    ) -> GatewayResult<RawStreamResult>;

    /// One page of search results
    async fn search(&self, query: &str, page: u32) -> GatewayResult<RawSearchPage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_server_parsing() {
        assert_eq!("VidCloud".parse::<StreamServer>().unwrap(), StreamServer::VidCloud);
        assert_eq!("upcloud".parse::<StreamServer>().unwrap(), StreamServer::UpCloud);
        assert!(matches!(
            "megacloud".parse::<StreamServer>(),
            Err(GatewayError::InvalidServer { .. })
        ));
    }

    #[test]
    fn test_raw_records_tolerate_missing_fields() {
        let item: RawMediaItem = serde_json::from_value(json!({ "id": "tv/watch-x-1" })).unwrap();
        assert_eq!(item.title, "");
        assert!(item.media_type.is_none());

        let page: RawSearchPage = serde_json::from_value(json!({
            "hasNextPage": true,
            "results": [{ "id": "a", "title": "A", "type": "Movie" }]
        }))
        .unwrap();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].media_type.as_deref(), Some("Movie"));
    }

    #[test]
    fn test_stream_result_field_names() {
        let raw: RawStreamResult = serde_json::from_value(json!({
            "sources": [{ "url": "https://cdn/a.m3u8", "quality": "auto", "isM3U8": true }],
            "subtitles": [{ "url": "https://cdn/en.vtt", "lang": "English" }]
        }))
        .unwrap();
        assert!(raw.sources[0].is_m3u8);
        assert_eq!(raw.subtitles[0].lang, "English");
    }
}
