//! API Routes
//!
//! Configures the Axum router with all proxy endpoints and their rate limits.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_cache_handler, health_handler, recent_handler,
    search_host_handler, search_url_handler, url_detail_handler,
};
use super::state::AppState;
use crate::rate_limit::enforce_rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Liveness check (general limit)
/// - `GET /api/v1/recent?limit=N` - Recent malicious URLs (strict limit)
/// - `POST /api/v1/search/url` - Look up one URL (strict limit)
/// - `POST /api/v1/search/host` - URLs seen on a host (strict limit)
/// - `GET /api/v1/detail/*url` - Full record for one URL (strict limit)
/// - `POST /api/v1/cache/clear` - Drop every cached entry (general limit)
/// - `GET /api/v1/cache/stats` - Cache counters (general limit)
///
/// # Middleware
/// - Rate limiting: applied per route group, so unknown paths are not counted.
///   Cache administration sits behind the general limiter, not the strict one,
///   because it never reaches URLhaus
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let strict = middleware::from_fn_with_state(state.strict.clone(), enforce_rate_limit);
    let general = middleware::from_fn_with_state(state.general.clone(), enforce_rate_limit);

    let lookups = Router::new()
        .route("/recent", get(recent_handler))
        .route("/search/url", post(search_url_handler))
        .route("/search/host", post(search_host_handler))
        .route("/detail/*url", get(url_detail_handler))
        .route_layer(strict);

    let admin = Router::new()
        .route("/cache/clear", post(clear_cache_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route_layer(general.clone());

    Router::new()
        .route("/health", get(health_handler))
        .route_layer(general)
        .nest("/api/v1", lookups.merge(admin))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::upstream::{FetchError, UrlDetail, UrlSummary, UrlhausApi};
    use crate::InMemoryBackend;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    #[derive(Debug)]
    struct EmptyUpstream;

    #[async_trait]
    impl UrlhausApi for EmptyUpstream {
        async fn fetch_recent(&self, _: &str, _: u32) -> Result<Vec<UrlSummary>, FetchError> {
            Ok(Vec::new())
        }

        async fn fetch_url_detail(&self, _: &str, url: &str) -> Result<UrlDetail, FetchError> {
            Ok(UrlDetail {
                query_status: "no_results".into(),
                url: url.to_string(),
                ..Default::default()
            })
        }

        async fn fetch_host_matches(&self, _: &str, _: &str) -> Result<Vec<UrlSummary>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn create_test_app() -> Router {
        let backend = InMemoryBackend::new(&Config::default(), Arc::new(EmptyUpstream));
        create_router(backend.state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-limit"], "100");
        assert_eq!(response.headers()["ratelimit-remaining"], "99");
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/cache/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-limit"], "100");
    }

    #[tokio::test]
    async fn test_cache_clear_uses_general_limit() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/cache/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-limit"], "100");
    }

    #[tokio::test]
    async fn test_lookup_routes_use_strict_limit() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/recent")
                    .header("Auth-Key", "k")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-limit"], "10");
        assert_eq!(response.headers()["ratelimit-remaining"], "9");
    }

    #[tokio::test]
    async fn test_detail_wildcard_captures_nested_path() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/detail/http%3A%2F%2Fevil.test%2Fa%2Fb.exe")
                    .header("Auth-Key", "k")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/api/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("ratelimit-limit").is_none());
    }
}
