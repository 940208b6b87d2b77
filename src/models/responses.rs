//! Response DTOs for the proxy API
//!
//! Every body is a JSON envelope with `success` and `timestamp`; camelCase on the wire.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::lookup::Fetched;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Success envelope: `{success, data?, message?, cached, timestamp}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cached: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T, cached: bool) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            cached,
            timestamp: now_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            cached: false,
            timestamp: now_rfc3339(),
        }
    }
}

impl<T> From<Fetched<T>> for ApiResponse<T> {
    fn from(fetched: Fetched<T>) -> Self {
        Self::data(fetched.data, fetched.cached)
    }
}

/// Error envelope: `{success: false, error, timestamp, retryAfter?}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    pub timestamp: String,
    /// Seconds to wait before retrying, only on rate limiting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: now_rfc3339(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            success: true,
            message: "URLhaus proxy is running".to_string(),
            timestamp: now_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Payload of `GET /api/v1/cache/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub counters: CacheStats,
    /// Live entries, absent when the store cannot say
    pub entries: Option<usize>,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl CacheStatsResponse {
    pub fn new(counters: CacheStats, entries: Option<usize>) -> Self {
        Self {
            hit_rate: counters.hit_rate(),
            counters,
            entries,
        }
    }
}
