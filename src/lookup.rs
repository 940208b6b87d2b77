//! Threat Lookup Module
//!
//! Read-through layer between the HTTP handlers and URLhaus: check the cache,
//! otherwise call upstream under a timeout and cache what comes back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::cache::{normalize_host, normalize_url, CacheKey, CacheService, CacheStats, TtlPolicy};
use crate::error::{ProxyError, Result};
use crate::upstream::{FetchError, UrlDetail, UrlSummary, UrlhausApi};

/// Default number of recent URLs
pub const DEFAULT_RECENT_LIMIT: u32 = 20;

/// Largest page URLhaus serves for the recent feed
pub const MAX_RECENT_LIMIT: u32 = 1_000;

// == Fetched ==
/// A result together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    /// True when served from the cache
    pub cached: bool,
}

// == Threat Lookup ==
#[derive(Debug, Clone)]
pub struct ThreatLookup {
    upstream: Arc<dyn UrlhausApi>,
    cache: Arc<CacheService>,
    ttl: TtlPolicy,
    upstream_timeout: Duration,
}

impl ThreatLookup {
    pub fn new(
        upstream: Arc<dyn UrlhausApi>,
        cache: Arc<CacheService>,
        ttl: TtlPolicy,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            upstream,
            cache,
            ttl,
            upstream_timeout,
        }
    }

    // == Recent ==
    /// Recent URLs, cached in the list TTL class.
    pub async fn recent(&self, auth_key: &str, limit: u32) -> Result<Fetched<Vec<UrlSummary>>> {
        let limit = limit.clamp(1, MAX_RECENT_LIMIT);
        let key = CacheKey::recent(limit);

        self.read_through(
            &key,
            self.ttl.list,
            "Failed to fetch recent URLs",
            self.upstream.fetch_recent(auth_key, limit),
        )
        .await
    }

    // == Search URL ==
    pub async fn search_url(&self, auth_key: &str, url: &str) -> Result<Fetched<UrlDetail>> {
        let url = required(normalize_url(url), "URL is required")?;
        let key = CacheKey::url_search(&url);

        self.read_through(
            &key,
            self.ttl.lookup,
            "Failed to search URL",
            self.upstream.fetch_url_detail(auth_key, &url),
        )
        .await
    }

    // == URL Detail ==
    pub async fn url_detail(&self, auth_key: &str, url: &str) -> Result<Fetched<UrlDetail>> {
        let url = required(normalize_url(url), "URL is required")?;
        let key = CacheKey::url_detail(&url);

        self.read_through(
            &key,
            self.ttl.lookup,
            "Failed to get URL details",
            self.upstream.fetch_url_detail(auth_key, &url),
        )
        .await
    }

    // == Search Host ==
    pub async fn search_host(
        &self,
        auth_key: &str,
        host: &str,
    ) -> Result<Fetched<Vec<UrlSummary>>> {
        let host = required(normalize_host(host), "Host is required")?;
        let key = CacheKey::host_search(&host);

        self.read_through(
            &key,
            self.ttl.lookup,
            "Failed to search host",
            self.upstream.fetch_host_matches(auth_key, &host),
        )
        .await
    }

    // == Cache Administration ==
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("cache cleared");
    }

    pub async fn cache_stats(&self) -> (CacheStats, Option<usize>) {
        (self.cache.stats(), self.cache.entry_count().await)
    }

    /// Serves `key` from the cache, or awaits `fetch` and caches a successful result.
    ///
    /// `fetch` is only polled on a miss. A failed or timed-out fetch leaves the cache untouched.
    async fn read_through<T, F>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        context: &str,
        fetch: F,
    ) -> Result<Fetched<T>>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = std::result::Result<T, FetchError>>,
    {
        if let Some(data) = self.cache.get::<T>(key.as_str()).await {
            return Ok(Fetched { data, cached: true });
        }

        let data = match tokio::time::timeout(self.upstream_timeout, fetch).await {
            Ok(Ok(data)) => data,
            Ok(Err(e)) => {
                error!(key = %key, error = %e, "upstream fetch failed");
                return Err(ProxyError::from_fetch(&e, context));
            }
            Err(_) => {
                error!(key = %key, timeout_ms = millis(self.upstream_timeout), "upstream fetch timed out");
                return Err(ProxyError::from_fetch(&FetchError::Timeout, context));
            }
        };

        self.cache.set(key.as_str(), &data, ttl).await;
        Ok(Fetched {
            data,
            cached: false,
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn required(value: String, message: &str) -> Result<String> {
    if value.is_empty() {
        Err(ProxyError::InvalidRequest(message.to_string()))
    } else {
        Ok(value)
    }
}
