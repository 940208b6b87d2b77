//! Rate Limit Middleware
//!
//! Axum middleware that runs every request through a [`FixedWindowLimiter`]
//! before it reaches a handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::error::{ProxyError, Result};
use crate::rate_limit::{Decision, FixedWindowLimiter};

const RATELIMIT_LIMIT: &str = "ratelimit-limit";
const RATELIMIT_REMAINING: &str = "ratelimit-remaining";
const RATELIMIT_RESET: &str = "ratelimit-reset";

/// Client identity used when neither the peer address nor a forwarded header is known
pub const UNKNOWN_CLIENT: &str = "unknown";

/// State handed to [`enforce_rate_limit`].
#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub limiter: Arc<FixedWindowLimiter>,
    pub trust_forwarded_for: bool,
}

impl RateLimitState {
    pub fn new(limiter: Arc<FixedWindowLimiter>, trust_forwarded_for: bool) -> Self {
        Self {
            limiter,
            trust_forwarded_for,
        }
    }
}

/// Admits or rejects the request, then annotates admitted responses with `RateLimit-*` headers.
pub async fn enforce_rate_limit(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let client = client_key(&request, state.trust_forwarded_for);

    match state.limiter.admit(&client).await? {
        Decision::Allowed {
            limit,
            remaining,
            reset_after_secs,
        } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
            headers.insert(RATELIMIT_RESET, HeaderValue::from(reset_after_secs));
            Ok(response)
        }
        Decision::Rejected {
            retry_after_secs, ..
        } => Err(ProxyError::RateLimitExceeded { retry_after_secs }),
    }
}

/// Identity a request is counted against.
///
/// The peer IP by default; the first `X-Forwarded-For` entry when the proxy
/// is configured to trust it.
pub fn client_key(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(forwarded) = forwarded_for(request.headers()) {
            return forwarded;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|entry| !entry.is_empty())
        .map(str::to_string)
}
