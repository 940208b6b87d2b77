//! Upstream Module
//!
//! The URLhaus API as seen by the proxy: an async trait for the three lookups it
//! needs, the failure type they share, and the reqwest-backed client.

mod client;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::HttpUrlhausClient;
pub use types::{Payload, UrlDetail, UrlSummary, VirusTotal};

/// Default URLhaus API base URL
pub const DEFAULT_API_URL: &str = "https://urlhaus-api.abuse.ch";

// == Fetch Error ==
/// Why an upstream call produced no result. Never retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("upstream request timed out")]
    Timeout,

    /// Connection failure or a 5xx answer
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// Bad auth key or a query URLhaus refuses
    #[error("upstream rejected the query: {0}")]
    Rejected(String),

    #[error("upstream response could not be decoded: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether the same request could succeed later without changing it.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Rejected(_))
    }

    /// Reason safe to show to clients.
    pub fn public_reason(&self) -> &str {
        match self {
            FetchError::Rejected(reason) => reason,
            _ => "upstream unavailable",
        }
    }
}

// == Urlhaus Api ==
/// The URLhaus lookups the proxy forwards.
#[async_trait]
pub trait UrlhausApi: Send + Sync + std::fmt::Debug + 'static {
    /// Most recent URLs added to URLhaus.
    async fn fetch_recent(&self, auth_key: &str, limit: u32) -> Result<Vec<UrlSummary>, FetchError>;

    /// Full record for one URL. A URL URLhaus does not know yields `query_status = "no_results"`.
    async fn fetch_url_detail(&self, auth_key: &str, url: &str) -> Result<UrlDetail, FetchError>;

    /// URLs observed on `host`.
    async fn fetch_host_matches(
        &self,
        auth_key: &str,
        host: &str,
    ) -> Result<Vec<UrlSummary>, FetchError>;
}
