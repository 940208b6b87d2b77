//! Cache Keys Module
//!
//! Deterministic cache keys for each upstream operation and the TTL class each one uses.

use std::fmt;
use std::time::Duration;

// == Cache Key ==
/// A cache key derived from an operation and its normalized parameters.
///
/// Each operation has its own prefix, so distinct operations never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn recent(limit: u32) -> Self {
        Self(format!("recent_urls_{}", limit))
    }

    pub fn url_search(url: &str) -> Self {
        Self(format!("url_search_{}", normalize_url(url)))
    }

    pub fn url_detail(url: &str) -> Self {
        Self(format!("url_detail_{}", normalize_url(url)))
    }

    pub fn host_search(host: &str) -> Self {
        Self(format!("host_search_{}", normalize_host(host)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// URLs are case sensitive past the host, so only surrounding whitespace goes.
pub fn normalize_url(url: &str) -> String {
    url.trim().to_string()
}

pub fn normalize_host(host: &str) -> String {
    host.trim().to_ascii_lowercase()
}

// == TTL Policy ==
/// TTL per operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// List-style queries such as the recent feed
    pub list: Duration,
    /// Point lookups: single URL detail or host matches
    pub lookup: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(5 * 60),
            lookup: Duration::from_secs(60 * 60),
        }
    }
}
