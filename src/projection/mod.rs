//! # Response Projection
//!
//! Pure mapping from raw upstream records to the public response schema.
//! Nothing here performs I/O or keeps state; projecting the same record twice
//! yields the same output.
//!
//! The upstream's free-form `type` string is resolved into [`MediaKind`] at
//! this boundary: the movie tag selects the movie shape, anything else is a
//! series.

pub mod links;

pub use links::{LinkBuilder, PageLinks};

use crate::core::error::{GatewayError, GatewayResult};
use crate::provider::{RawDetail, RawMediaItem, RawSearchPage, RawStreamResult};
use serde::{Deserialize, Serialize};

/// The upstream's type tag for movies
pub const MOVIE_TAG: &str = "Movie";

/// Media variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Movie when the declared type is the movie tag, series otherwise
    pub fn from_declared(declared: Option<&str>) -> Self {
        match declared {
            Some(tag) if tag.trim().eq_ignore_ascii_case(MOVIE_TAG) => Self::Movie,
            _ => Self::Series,
        }
    }
}

/// Entry of a trending list or search page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaSummary {
    Movie {
        id: String,
        title: String,
        image: Option<String>,
        release_date: Option<String>,
        duration: Option<String>,
    },
    Series {
        id: String,
        title: String,
        image: Option<String>,
        latest_season: Option<String>,
        latest_episode: Option<String>,
    },
}

impl MediaSummary {
    pub fn id(&self) -> &str {
        match self {
            Self::Movie { id, .. } | Self::Series { id, .. } => id,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Movie { .. } => MediaKind::Movie,
            Self::Series { .. } => MediaKind::Series,
        }
    }
}

/// Body of `GET /main`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingResponse {
    pub trending_tv: Vec<MediaSummary>,
    pub trending_movies: Vec<MediaSummary>,
}

/// Full item detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDetail {
    pub id: String,
    pub title: String,
    pub cover: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub release_date: Option<String>,
    pub duration: Option<String>,
    pub rating: Option<f64>,
    pub episodes: Episodes,
}

/// A movie exposes one watch link, a series one per episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Episodes {
    Movie(WatchRef),
    Series(Vec<EpisodeRef>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRef {
    pub watch_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub title: String,
    pub episode_number: Option<u32>,
    pub season: Option<u32>,
    pub watch_url: String,
}

/// Selected playback source for an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSource {
    pub playback_url: String,
    pub subtitles: Vec<SubtitleTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub lang: String,
}

/// One page of search results with navigation links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<MediaSummary>,
    pub current_page: u32,
    pub has_next_page: bool,
    pub next_page_url: Option<String>,
    pub prev_page_url: Option<String>,
}

/// Project a trending or search entry, labels kept verbatim
pub fn project_summary(raw: &RawMediaItem) -> MediaSummary {
    match MediaKind::from_declared(raw.media_type.as_deref()) {
        MediaKind::Movie => MediaSummary::Movie {
            id: raw.id.clone(),
            title: raw.title.clone(),
            image: raw.image.clone(),
            release_date: raw.release_date.clone(),
            duration: raw.duration.clone(),
        },
        MediaKind::Series => MediaSummary::Series {
            id: raw.id.clone(),
            title: raw.title.clone(),
            image: raw.image.clone(),
            latest_season: raw.season.clone(),
            latest_episode: raw.latest_episode.clone(),
        },
    }
}

/// Project the trending-TV list, trimming the season and episode label prefixes
pub fn project_trending_tv(items: &[RawMediaItem]) -> Vec<MediaSummary> {
    items
        .iter()
        .map(|raw| match project_summary(raw) {
            MediaSummary::Series {
                id,
                title,
                image,
                latest_season,
                latest_episode,
            } => MediaSummary::Series {
                id,
                title,
                image,
                latest_season: latest_season.map(|s| strip_label(&s, &["SS ", "S "]).to_string()),
                latest_episode: latest_episode.map(|e| strip_label(&e, &["EPS ", "EP "]).to_string()),
            },
            movie => movie,
        })
        .collect()
}

/// Project the trending-movies list
pub fn project_trending_movies(items: &[RawMediaItem]) -> Vec<MediaSummary> {
    items.iter().map(project_summary).collect()
}

/// Remove the first matching prefix; no match leaves the label unchanged
pub fn strip_label<'a>(label: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .find_map(|prefix| label.strip_prefix(prefix))
        .unwrap_or(label)
}

/// Project a detail record.
///
/// Movies link to the first upstream episode; series list every episode in
/// upstream order.
pub fn project_detail(raw: &RawDetail, links: &LinkBuilder) -> MediaDetail {
    let kind = MediaKind::from_declared(raw.media_type.as_deref());

    let episodes = match kind {
        MediaKind::Movie => Episodes::Movie(WatchRef {
            watch_url: raw
                .episodes
                .first()
                .map(|episode| links.watch_url(&episode.id, &raw.id)),
        }),
        MediaKind::Series => Episodes::Series(
            raw.episodes
                .iter()
                .map(|episode| EpisodeRef {
                    title: episode.title.clone(),
                    episode_number: episode.number,
                    season: episode.season,
                    watch_url: links.watch_url(&episode.id, &raw.id),
                })
                .collect(),
        ),
    };

    MediaDetail {
        id: raw.id.clone(),
        title: raw.title.clone(),
        cover: raw.cover.clone(),
        image: raw.image.clone(),
        description: raw.description.clone(),
        kind,
        release_date: raw.release_date.clone(),
        duration: raw.duration.clone(),
        rating: raw.rating,
        episodes,
    }
}

/// Select the playback source.
///
/// The last upstream candidate wins; no quality ranking is applied. An empty
/// candidate list is an upstream failure.
pub fn project_stream(raw: &RawStreamResult) -> GatewayResult<StreamSource> {
    let selected = raw
        .sources
        .last()
        .ok_or_else(|| GatewayError::upstream("upstream returned no stream sources"))?;

    Ok(StreamSource {
        playback_url: selected.url.clone(),
        subtitles: raw
            .subtitles
            .iter()
            .map(|track| SubtitleTrack {
                url: track.url.clone(),
                lang: track.lang.clone(),
            })
            .collect(),
    })
}

/// Project a search page and attach its navigation links
pub fn project_search(raw: &RawSearchPage, query: &str, links: &LinkBuilder) -> SearchPage {
    let current_page = raw.current_page.max(1);
    let PageLinks { next, prev } = links.page_links(query, current_page, raw.has_next_page);

    SearchPage {
        items: raw.items.iter().map(project_summary).collect(),
        current_page,
        has_next_page: raw.has_next_page,
        next_page_url: next,
        prev_page_url: prev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{RawEpisode, RawSource, RawSubtitle};
    use serde_json::json;

    fn links() -> LinkBuilder {
        LinkBuilder::new("http://gw.local")
    }

    fn series_item(season: &str, episode: &str) -> RawMediaItem {
        RawMediaItem {
            id: "tv/watch-severance-1".to_string(),
            title: "Severance".to_string(),
            image: Some("https://img/sev.jpg".to_string()),
            media_type: Some("TV Series".to_string()),
            release_date: None,
            duration: None,
            season: Some(season.to_string()),
            latest_episode: Some(episode.to_string()),
        }
    }

    fn movie_item() -> RawMediaItem {
        RawMediaItem {
            id: "movie/watch-dune-2".to_string(),
            title: "Dune".to_string(),
            image: None,
            media_type: Some("Movie".to_string()),
            release_date: Some("2024".to_string()),
            duration: Some("166m".to_string()),
            season: None,
            latest_episode: None,
        }
    }

    fn episode(id: &str, number: u32) -> RawEpisode {
        RawEpisode {
            id: id.to_string(),
            title: format!("Episode {}", number),
            number: Some(number),
            season: Some(1),
        }
    }

    fn detail(media_type: &str, episodes: Vec<RawEpisode>) -> RawDetail {
        RawDetail {
            id: "movie-42".to_string(),
            title: "Forty Two".to_string(),
            cover: Some("https://img/cover.jpg".to_string()),
            image: Some("https://img/poster.jpg".to_string()),
            description: Some("A film.".to_string()),
            media_type: Some(media_type.to_string()),
            release_date: Some("2020-01-01".to_string()),
            duration: Some("98m".to_string()),
            rating: Some(7.4),
            episodes,
        }
    }

    #[test]
    fn test_kind_branching() {
        assert_eq!(MediaKind::from_declared(Some("Movie")), MediaKind::Movie);
        assert_eq!(MediaKind::from_declared(Some("movie")), MediaKind::Movie);
        assert_eq!(MediaKind::from_declared(Some("TV Series")), MediaKind::Series);
        assert_eq!(MediaKind::from_declared(None), MediaKind::Series);
    }

    #[test]
    fn test_summary_variants() {
        let movie = project_summary(&movie_item());
        assert_eq!(movie.kind(), MediaKind::Movie);
        assert_eq!(
            serde_json::to_value(&movie).unwrap(),
            json!({
                "type": "movie",
                "id": "movie/watch-dune-2",
                "title": "Dune",
                "image": null,
                "release_date": "2024",
                "duration": "166m"
            })
        );

        let series = project_summary(&series_item("SS 2", "EPS 10"));
        assert_eq!(series.kind(), MediaKind::Series);
        assert_eq!(series.id(), "tv/watch-severance-1");
        // Search and trending-movie projections keep labels verbatim
        match series {
            MediaSummary::Series { latest_season, .. } => assert_eq!(latest_season.as_deref(), Some("SS 2")),
            other => panic!("expected series, got {:?}", other),
        }
    }

    #[test]
    fn test_trending_tv_strips_label_prefixes() {
        let items = vec![
            series_item("SS 3", "EPS 8"),
            series_item("S 1", "EP 2"),
            series_item("Season 4", "Finale"),
        ];

        let projected = project_trending_tv(&items);

        let labels: Vec<(Option<String>, Option<String>)> = projected
            .into_iter()
            .map(|summary| match summary {
                MediaSummary::Series {
                    latest_season,
                    latest_episode,
                    ..
                } => (latest_season, latest_episode),
                other => panic!("expected series, got {:?}", other),
            })
            .collect();

        assert_eq!(
            labels,
            vec![
                (Some("3".to_string()), Some("8".to_string())),
                (Some("1".to_string()), Some("2".to_string())),
                (Some("Season 4".to_string()), Some("Finale".to_string())),
            ]
        );
    }

    #[test]
    fn test_strip_label_prefers_longer_prefix() {
        assert_eq!(strip_label("SS 3", &["SS ", "S "]), "3");
        assert_eq!(strip_label("EPS 12", &["EPS ", "EP "]), "12");
        assert_eq!(strip_label("", &["SS ", "S "]), "");
    }

    #[test]
    fn test_movie_detail_links_first_episode() {
        let raw = detail("Movie", vec![episode("ep-1", 1), episode("ep-2", 2)]);

        let projected = project_detail(&raw, &links());

        assert_eq!(projected.kind, MediaKind::Movie);
        match &projected.episodes {
            Episodes::Movie(watch) => assert_eq!(
                watch.watch_url.as_deref(),
                Some("http://gw.local/watch?episodeId=ep-1&mediaId=movie-42")
            ),
            other => panic!("expected a single watch link, got {:?}", other),
        }
        let body = serde_json::to_value(&projected).unwrap();
        assert!(body["episodes"].is_object());
        assert_eq!(body["type"], "movie");
    }

    #[test]
    fn test_movie_detail_without_episodes() {
        let projected = project_detail(&detail("Movie", vec![]), &links());
        assert_eq!(projected.episodes, Episodes::Movie(WatchRef { watch_url: None }));
    }

    #[test]
    fn test_series_detail_preserves_episode_order() {
        let raw = detail("TV Series", vec![episode("e3", 3), episode("e1", 1), episode("e2", 2)]);

        let projected = project_detail(&raw, &links());

        match projected.episodes {
            Episodes::Series(episodes) => {
                let numbers: Vec<_> = episodes.iter().map(|e| e.episode_number).collect();
                assert_eq!(numbers, vec![Some(3), Some(1), Some(2)]);
                assert!(episodes[0].watch_url.ends_with("episodeId=e3&mediaId=movie-42"));
            }
            other => panic!("expected episode list, got {:?}", other),
        }
    }

    #[test]
    fn test_projection_is_idempotent() {
        let raw = detail("TV Series", vec![episode("e1", 1)]);
        assert_eq!(project_detail(&raw, &links()), project_detail(&raw, &links()));

        let items = vec![series_item("SS 1", "EPS 1"), movie_item()];
        assert_eq!(project_trending_tv(&items), project_trending_tv(&items));
    }

    #[test]
    fn test_stream_selects_last_source() {
        let raw = RawStreamResult {
            sources: ["A", "B", "C"]
                .iter()
                .map(|name| RawSource {
                    url: format!("https://cdn/{}.m3u8", name),
                    quality: Some("auto".to_string()),
                    is_m3u8: true,
                })
                .collect(),
            subtitles: vec![RawSubtitle {
                url: "https://cdn/en.vtt".to_string(),
                lang: "English".to_string(),
            }],
        };

        let stream = project_stream(&raw).unwrap();

        assert_eq!(stream.playback_url, "https://cdn/C.m3u8");
        assert_eq!(stream.subtitles.len(), 1);
    }

    #[test]
    fn test_stream_without_sources_fails() {
        let raw = RawStreamResult {
            sources: vec![],
            subtitles: vec![],
        };
        assert!(matches!(project_stream(&raw), Err(GatewayError::Upstream { .. })));
    }

    #[test]
    fn test_search_page_links() {
        let raw = RawSearchPage {
            current_page: 3,
            has_next_page: true,
            items: vec![movie_item()],
        };

        let page = project_search(&raw, "foo", &links());

        assert_eq!(page.current_page, 3);
        assert_eq!(page.next_page_url.as_deref(), Some("http://gw.local/search/foo?page=4"));
        assert_eq!(page.prev_page_url.as_deref(), Some("http://gw.local/search/foo?page=2"));
        assert_eq!(page.items.len(), 1);
    }
}
