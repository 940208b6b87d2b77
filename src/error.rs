//! Error types for the proxy
//!
//! Provides unified error handling using thiserror. Cache failures never appear
//! here: they are absorbed by the cache service.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::rate_limit::RateLimitError;
use crate::upstream::FetchError;

// == Proxy Error Enum ==
/// Unified error type for request handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Client exhausted its quota; retry after the hint
    #[error("Too many requests, please try again later")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Upstream timed out, could not be reached, or answered garbage
    #[error("{0}")]
    UpstreamUnavailable(String),

    /// Upstream refused the query (bad auth key, malformed input)
    #[error("{0}")]
    UpstreamRejected(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Counter store failed and the limiter is configured to fail closed
    #[error("Rate limiting is temporarily unavailable")]
    RateLimiterUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Maps an upstream failure onto the error taxonomy, using `context` as the
    /// message shown to clients.
    pub fn from_fetch(err: &FetchError, context: &str) -> Self {
        if err.is_retryable() {
            ProxyError::UpstreamUnavailable(context.to_string())
        } else {
            ProxyError::UpstreamRejected(format!("{}: {}", context, err.public_reason()))
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UpstreamRejected(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ProxyError::RateLimiterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RateLimitError> for ProxyError {
    fn from(err: RateLimitError) -> Self {
        ProxyError::RateLimiterUnavailable(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ProxyError::RateLimiterUnavailable(detail) | ProxyError::Internal(detail) => {
                error!(status = status.as_u16(), detail = %detail, "request failed");
            }
            _ => {}
        }

        let mut body = ErrorResponse::new(self.to_string());
        if let ProxyError::RateLimitExceeded { retry_after_secs } = self {
            body = body.with_retry_after(retry_after_secs);
            let mut response = (status, Json(body)).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            return response;
        }

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for request handling.
pub type Result<T> = std::result::Result<T, ProxyError>;
