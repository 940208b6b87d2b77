//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint. Upstream-bound handlers take
//! the caller's [`AuthKey`] and delegate to [`ThreatLookup`](crate::lookup::ThreatLookup).

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use super::auth::AuthKey;
use super::state::AppState;
use crate::error::Result;
use crate::models::{
    ApiResponse, CacheStatsResponse, HealthResponse, RecentQuery, SearchHostRequest,
    SearchUrlRequest,
};
use crate::upstream::{UrlDetail, UrlSummary};

/// Handler for GET /api/v1/recent
///
/// Lists recently reported malicious URLs. `?limit=` defaults to 20.
pub async fn recent_handler(
    State(state): State<AppState>,
    auth: AuthKey,
    Query(query): Query<RecentQuery>,
) -> Result<Json<ApiResponse<Vec<UrlSummary>>>> {
    let limit = query.effective_limit();
    debug!(limit, "recent urls requested");

    let fetched = state.lookup.recent(auth.as_str(), limit).await?;
    Ok(Json(fetched.into()))
}

/// Handler for POST /api/v1/search/url
pub async fn search_url_handler(
    State(state): State<AppState>,
    auth: AuthKey,
    Json(req): Json<SearchUrlRequest>,
) -> Result<Json<ApiResponse<UrlDetail>>> {
    let fetched = state.lookup.search_url(auth.as_str(), &req.url).await?;
    Ok(Json(fetched.into()))
}

/// Handler for POST /api/v1/search/host
pub async fn search_host_handler(
    State(state): State<AppState>,
    auth: AuthKey,
    Json(req): Json<SearchHostRequest>,
) -> Result<Json<ApiResponse<Vec<UrlSummary>>>> {
    let fetched = state.lookup.search_host(auth.as_str(), &req.host).await?;
    Ok(Json(fetched.into()))
}

/// Handler for GET /api/v1/detail/*url
///
/// The URL is the rest of the path, percent-decoded by the extractor.
pub async fn url_detail_handler(
    State(state): State<AppState>,
    auth: AuthKey,
    Path(url): Path<String>,
) -> Result<Json<ApiResponse<UrlDetail>>> {
    let fetched = state.lookup.url_detail(auth.as_str(), &url).await?;
    Ok(Json(fetched.into()))
}

/// Handler for POST /api/v1/cache/clear
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    state.lookup.clear_cache().await;
    Json(ApiResponse::message("Cache cleared successfully"))
}

/// Handler for GET /api/v1/cache/stats
pub async fn cache_stats_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<CacheStatsResponse>> {
    let (counters, entries) = state.lookup.cache_stats().await;
    Json(ApiResponse::data(
        CacheStatsResponse::new(counters, entries),
        false,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
