//! URLhaus HTTP client
//!
//! Thin reqwest wrapper that attaches the `Auth-Key` header and maps every
//! failure onto [`FetchError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::types::UrlListResponse;
use super::{FetchError, UrlDetail, UrlSummary, UrlhausApi};

/// Header carrying the caller's URLhaus key
const AUTH_KEY_HEADER: &str = "Auth-Key";

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Client for the URLhaus v1 API
#[derive(Debug, Clone)]
pub struct HttpUrlhausClient {
    http_client: Client,
    /// Base URL for the API (overridable for testing)
    base_url: String,
}

impl HttpUrlhausClient {
    /// Creates a client whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("urlhaus_proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends `request` and decodes a successful JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FetchError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Rejected("unknown_auth_key".to_string()));
        }
        if status.is_client_error() {
            return Err(FetchError::Rejected(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {}", status.as_u16())));
        }

        Ok(response.json::<T>().await?)
    }

    async fn fetch_list(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<Vec<UrlSummary>, FetchError> {
        let body: UrlListResponse = self.send(request).await.inspect_err(|e| {
            error!(operation, error = %e, "URLhaus API error");
        })?;
        check_query_status(&body.query_status)?;

        let urls = body.urls.unwrap_or_default();
        debug!(operation, count = urls.len(), "URLhaus list fetched");
        Ok(urls)
    }
}

/// `ok` and `no_results` are answers; any other status is URLhaus refusing the query.
fn check_query_status(status: &str) -> Result<(), FetchError> {
    match status {
        "ok" | "no_results" => Ok(()),
        "" => Err(FetchError::Malformed("missing query_status".to_string())),
        other => Err(FetchError::Rejected(other.to_string())),
    }
}

#[async_trait]
impl UrlhausApi for HttpUrlhausClient {
    async fn fetch_recent(&self, auth_key: &str, limit: u32) -> Result<Vec<UrlSummary>, FetchError> {
        let request = self
            .http_client
            .get(self.endpoint("/api/v1/urls/recent/"))
            .header(AUTH_KEY_HEADER, auth_key)
            .query(&[("limit", limit)]);

        self.fetch_list(request, "recent").await
    }

    async fn fetch_url_detail(&self, auth_key: &str, url: &str) -> Result<UrlDetail, FetchError> {
        let request = self
            .http_client
            .post(self.endpoint("/api/v1/url/"))
            .header(AUTH_KEY_HEADER, auth_key)
            .form(&[("url", url)]);

        let detail: UrlDetail = self.send(request).await.inspect_err(|e| {
            error!(operation = "url", error = %e, "URLhaus API error");
        })?;
        check_query_status(&detail.query_status)?;
        Ok(detail)
    }

    async fn fetch_host_matches(
        &self,
        auth_key: &str,
        host: &str,
    ) -> Result<Vec<UrlSummary>, FetchError> {
        let request = self
            .http_client
            .post(self.endpoint("/api/v1/host/"))
            .header(AUTH_KEY_HEADER, auth_key)
            .form(&[("host", host)]);

        self.fetch_list(request, "host").await
    }
}
