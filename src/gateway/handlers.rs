//! # Request Handlers
//!
//! Each handler validates its parameters, builds the cache key, resolves the
//! raw record through the cache-aside orchestrator and projects it. Parameter
//! errors are returned before the cache or the upstream is touched.

use super::server::AppState;
use crate::core::error::{GatewayError, GatewayResult};
use crate::projection::{self, MediaDetail, SearchPage, StreamSource, TrendingResponse};
use crate::provider::StreamServer;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct InfoParams {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchParams {
    pub episode_id: Option<String>,
    pub media_id: Option<String>,
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub page: Option<String>,
}

/// A present, non-blank parameter or `<param> is required`
fn required(value: Option<String>, param: &str) -> GatewayResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(GatewayError::missing(param)),
    }
}

/// Blank counts as absent
fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_server(value: Option<String>) -> GatewayResult<Option<StreamServer>> {
    optional(value).map(|v| v.parse()).transpose()
}

/// Positive page number; absent means page 1
fn parse_page(value: Option<String>) -> GatewayResult<Option<u32>> {
    match optional(value) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(page) if page >= 1 => Ok(Some(page)),
            _ => Err(GatewayError::InvalidPage { value: raw }),
        },
    }
}

/// `GET /main`
#[instrument(skip_all)]
pub async fn trending(State(state): State<AppState>) -> GatewayResult<Json<TrendingResponse>> {
    let series = state
        .cache
        .fetch_or_populate(&state.keys.trending_tv(), state.ttl.trending, || {
            state.with_deadline(state.provider.trending_series())
        })
        .await?;

    let movies = state
        .cache
        .fetch_or_populate(&state.keys.trending_movies(), state.ttl.trending, || {
            state.with_deadline(state.provider.trending_movies())
        })
        .await?;

    Ok(Json(TrendingResponse {
        trending_tv: projection::project_trending_tv(&series),
        trending_movies: projection::project_trending_movies(&movies),
    }))
}

/// `GET /info?id=`
#[instrument(skip_all, fields(id))]
pub async fn info(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<InfoParams>, QueryRejection>,
) -> GatewayResult<Json<MediaDetail>> {
    let Query(params) = params?;
    let id = required(params.id, "id")?;
    tracing::Span::current().record("id", id.as_str());

    let raw = state
        .cache
        .fetch_or_populate(&state.keys.info(&id), state.ttl.info, || {
            state.with_deadline(state.provider.detail(&id))
        })
        .await?;

    Ok(Json(projection::project_detail(&raw, &state.links(&headers))))
}

/// `GET /watch?episodeId=&mediaId=&server=`
#[instrument(skip_all)]
pub async fn watch(
    State(state): State<AppState>,
    params: Result<Query<WatchParams>, QueryRejection>,
) -> GatewayResult<Json<StreamSource>> {
    let Query(params) = params?;
    let episode_id = required(params.episode_id, "episodeId")?;
    let media_id = required(params.media_id, "mediaId")?;
    let server = parse_server(params.server)?;

    let key = state
        .keys
        .watch(&episode_id, &media_id, server.as_ref().map(StreamServer::as_str));

    let raw = state
        .cache
        .fetch_or_populate(&key, state.ttl.watch, || {
            state.with_deadline(state.provider.stream_sources(&episode_id, &media_id, server))
        })
        .await?;

    Ok(Json(projection::project_stream(&raw)?))
}

/// `GET /search/:query?page=`
#[instrument(skip_all, fields(query))]
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Path<String>, PathRejection>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> GatewayResult<Json<SearchPage>> {
    let Path(query) = query?;
    let Query(params) = params?;
    let query = required(Some(query), "query")?;
    tracing::Span::current().record("query", query.as_str());
    let page = parse_page(params.page)?;
    let page_component = page.map(|p| p.to_string());

    let raw = state
        .cache
        .fetch_or_populate(
            &state.keys.search(&query, page_component.as_deref()),
            state.ttl.search,
            || state.with_deadline(state.provider.search(&query, page.unwrap_or(1))),
        )
        .await?;

    Ok(Json(projection::project_search(&raw, &query, &state.links(&headers))))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let cache = match state.cache.store() {
        None => json!({ "enabled": false }),
        Some(store) => {
            let healthy = tokio::time::timeout(state.cache_probe_timeout, store.health_check())
                .await
                .map(|result| result.unwrap_or(false))
                .unwrap_or(false);
            json!({ "enabled": true, "backend": store.backend_name(), "healthy": healthy })
        }
    };

    Json(json!({ "status": "ok", "cache": cache }))
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> GatewayError {
    GatewayError::RouteNotFound {
        path: uri.path().to_string(),
    }
}
