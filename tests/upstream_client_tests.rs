//! Integration Tests for the URLhaus client
//!
//! Runs [`HttpUrlhausClient`] against a local axum server that mimics the
//! URLhaus v1 endpoints.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use urlhaus_proxy::upstream::{FetchError, HttpUrlhausClient, UrlhausApi};

const GOOD_KEY: &str = "good-key";

// == Emulated URLhaus ==

#[derive(Deserialize)]
struct LimitParams {
    limit: u32,
}

#[derive(Deserialize)]
struct UrlForm {
    url: String,
}

#[derive(Deserialize)]
struct HostForm {
    host: String,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("auth-key").and_then(|v| v.to_str().ok()) == Some(GOOD_KEY)
}

async fn recent(headers: HeaderMap, Query(params): Query<LimitParams>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let urls: Vec<_> = (0..params.limit)
        .map(|i| {
            json!({
                "id": i.to_string(),
                "url": format!("http://feed.test/{}", i),
                "url_status": "online",
                "tags": ["elf", "mozi"],
            })
        })
        .collect();
    Json(json!({"query_status": "ok", "urls": urls})).into_response()
}

async fn url_lookup(headers: HeaderMap, Form(form): Form<UrlForm>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let body = match form.url.as_str() {
        "http://unknown.test/" => json!({"query_status": "no_results"}),
        "not a url" => json!({"query_status": "invalid_url"}),
        url => json!({
            "query_status": "ok",
            "id": "42",
            "url": url,
            "threat": "malware_download",
            "blacklists": {"spamhaus_dbl": "not listed"},
            "payloads": [{"filename": "a.exe", "response_sha256": "abc"}],
        }),
    };
    Json(body).into_response()
}

async fn host_lookup(headers: HeaderMap, Form(form): Form<HostForm>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match form.host.as_str() {
        "slow.test" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"query_status": "no_results"})).into_response()
        }
        "broken.test" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "garbage.test" => "<html>oops</html>".into_response(),
        "silent.test" => Json(json!({"urls": []})).into_response(),
        "quiet.test" => Json(json!({"query_status": "no_results"})).into_response(),
        host => Json(json!({
            "query_status": "ok",
            "urls": [{"url": format!("http://{}/x", host), "host": host}],
        }))
        .into_response(),
    }
}

async fn spawn_urlhaus() -> SocketAddr {
    let app = Router::new()
        .route("/api/v1/urls/recent/", get(recent))
        .route("/api/v1/url/", post(url_lookup))
        .route("/api/v1/host/", post(host_lookup));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn client() -> HttpUrlhausClient {
    let addr = spawn_urlhaus().await;
    HttpUrlhausClient::new(format!("http://{}/", addr), Duration::from_millis(500)).unwrap()
}

// == Recent ==

#[tokio::test]
async fn test_recent_sends_limit_and_key() {
    let client = client().await;

    let urls = client.fetch_recent(GOOD_KEY, 3).await.unwrap();

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[2].url, "http://feed.test/2");
    assert_eq!(urls[0].tags.as_deref(), Some(&["elf".to_string(), "mozi".to_string()][..]));
}

#[tokio::test]
async fn test_bad_key_is_rejected() {
    let client = client().await;

    let err = client.fetch_recent("wrong", 3).await.unwrap_err();

    assert_eq!(err, FetchError::Rejected("unknown_auth_key".into()));
    assert!(!err.is_retryable());
}

// == URL ==

#[tokio::test]
async fn test_url_detail_is_decoded() {
    let client = client().await;

    let detail = client
        .fetch_url_detail(GOOD_KEY, "http://evil.test/a.exe")
        .await
        .unwrap();

    assert_eq!(detail.query_status, "ok");
    assert_eq!(detail.url, "http://evil.test/a.exe");
    assert_eq!(detail.payloads.len(), 1);
    assert_eq!(detail.payloads[0].filename.as_deref(), Some("a.exe"));
}

#[tokio::test]
async fn test_no_results_is_an_answer() {
    let client = client().await;

    let detail = client
        .fetch_url_detail(GOOD_KEY, "http://unknown.test/")
        .await
        .unwrap();

    assert_eq!(detail.query_status, "no_results");
    assert!(detail.payloads.is_empty());
}

#[tokio::test]
async fn test_refused_query_is_rejected() {
    let client = client().await;

    let err = client.fetch_url_detail(GOOD_KEY, "not a url").await.unwrap_err();

    assert_eq!(err, FetchError::Rejected("invalid_url".into()));
}

// == Host ==

#[tokio::test]
async fn test_host_matches() {
    let client = client().await;

    let urls = client.fetch_host_matches(GOOD_KEY, "evil.test").await.unwrap();
    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0].host.as_deref(), Some("evil.test"));

    let none = client.fetch_host_matches(GOOD_KEY, "quiet.test").await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_transport_failures_are_retryable() {
    let client = client().await;

    let timeout = client.fetch_host_matches(GOOD_KEY, "slow.test").await.unwrap_err();
    assert_eq!(timeout, FetchError::Timeout);

    let server_error = client.fetch_host_matches(GOOD_KEY, "broken.test").await.unwrap_err();
    assert_eq!(server_error, FetchError::Transport("HTTP 500".into()));

    let garbage = client.fetch_host_matches(GOOD_KEY, "garbage.test").await.unwrap_err();
    assert!(matches!(garbage, FetchError::Malformed(_)));

    let silent = client.fetch_host_matches(GOOD_KEY, "silent.test").await.unwrap_err();
    assert!(matches!(silent, FetchError::Malformed(_)));

    for err in [timeout, server_error, garbage, silent] {
        assert!(err.is_retryable());
    }
}
