//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::TtlPolicy;
use crate::rate_limit::{FailureMode, RateLimitConfig};
use crate::upstream::DEFAULT_API_URL;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// URLhaus API base URL
    pub urlhaus_api_url: String,
    /// Upstream request timeout in milliseconds
    pub upstream_timeout_ms: u64,
    /// Strict limiter window in milliseconds (upstream-bound routes)
    pub rate_limit_window_ms: u64,
    pub rate_limit_max_requests: u32,
    /// General limiter window in milliseconds (all other routes)
    pub general_rate_limit_window_ms: u64,
    pub general_rate_limit_max_requests: u32,
    /// Refuse requests instead of admitting them when the counter store fails
    pub rate_limit_fail_closed: bool,
    /// Maximum number of live rate-limit counters; new clients beyond it are
    /// handled by the failure mode instead of displacing existing counters
    pub rate_limit_max_entries: usize,
    /// Take the client identity from `X-Forwarded-For` (only behind a trusted proxy)
    pub trust_forwarded_for: bool,
    /// Maximum number of entries the cache store can hold
    pub cache_max_entries: usize,
    /// TTL in milliseconds for list-style queries
    pub cache_list_ttl_ms: u64,
    /// TTL in milliseconds for point lookups
    pub cache_lookup_ttl_ms: u64,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3001)
    /// - `URLHAUS_API_URL` - URLhaus base URL (default: https://urlhaus-api.abuse.ch)
    /// - `URLHAUS_API_TIMEOUT` - Upstream timeout in ms (default: 30000)
    /// - `RATE_LIMIT_WINDOW_MS` / `RATE_LIMIT_MAX_REQUESTS` - Strict limiter (default: 300000 / 10)
    /// - `GENERAL_RATE_LIMIT_WINDOW_MS` / `GENERAL_RATE_LIMIT_MAX_REQUESTS` - General limiter (default: 900000 / 100)
    /// - `RATE_LIMIT_FAIL_CLOSED` - Fail closed on counter store errors (default: false)
    /// - `RATE_LIMIT_MAX_ENTRIES` - Counter store capacity (default: 100000)
    /// - `TRUST_FORWARDED_FOR` - Use `X-Forwarded-For` as client identity (default: false)
    /// - `CACHE_MAX_ENTRIES` - Cache store capacity (default: 10000)
    /// - `CACHE_LIST_TTL_MS` / `CACHE_LOOKUP_TTL_MS` - TTL classes (default: 300000 / 3600000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            urlhaus_api_url: env::var("URLHAUS_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.urlhaus_api_url),
            upstream_timeout_ms: env_or("URLHAUS_API_TIMEOUT", defaults.upstream_timeout_ms),
            rate_limit_window_ms: env_or("RATE_LIMIT_WINDOW_MS", defaults.rate_limit_window_ms),
            rate_limit_max_requests: env_or(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            ),
            general_rate_limit_window_ms: env_or(
                "GENERAL_RATE_LIMIT_WINDOW_MS",
                defaults.general_rate_limit_window_ms,
            ),
            general_rate_limit_max_requests: env_or(
                "GENERAL_RATE_LIMIT_MAX_REQUESTS",
                defaults.general_rate_limit_max_requests,
            ),
            rate_limit_fail_closed: env_or(
                "RATE_LIMIT_FAIL_CLOSED",
                defaults.rate_limit_fail_closed,
            ),
            rate_limit_max_entries: env_or(
                "RATE_LIMIT_MAX_ENTRIES",
                defaults.rate_limit_max_entries,
            ),
            trust_forwarded_for: env_or("TRUST_FORWARDED_FOR", defaults.trust_forwarded_for),
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_list_ttl_ms: env_or("CACHE_LIST_TTL_MS", defaults.cache_list_ttl_ms),
            cache_lookup_ttl_ms: env_or("CACHE_LOOKUP_TTL_MS", defaults.cache_lookup_ttl_ms),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            list: Duration::from_millis(self.cache_list_ttl_ms),
            lookup: Duration::from_millis(self.cache_lookup_ttl_ms),
        }
    }

    pub fn strict_rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(
            "strict",
            Duration::from_millis(self.rate_limit_window_ms),
            self.rate_limit_max_requests,
        )
        .with_failure_mode(self.failure_mode())
    }

    pub fn general_rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(
            "general",
            Duration::from_millis(self.general_rate_limit_window_ms),
            self.general_rate_limit_max_requests,
        )
        .with_failure_mode(self.failure_mode())
    }

    fn failure_mode(&self) -> FailureMode {
        if self.rate_limit_fail_closed {
            FailureMode::FailClosed
        } else {
            FailureMode::FailOpen
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3001,
            urlhaus_api_url: DEFAULT_API_URL.to_string(),
            upstream_timeout_ms: 30_000,
            rate_limit_window_ms: 300_000,
            rate_limit_max_requests: 10,
            general_rate_limit_window_ms: 900_000,
            general_rate_limit_max_requests: 100,
            rate_limit_fail_closed: false,
            rate_limit_max_entries: 100_000,
            trust_forwarded_for: false,
            cache_max_entries: 10_000,
            cache_list_ttl_ms: 300_000,
            cache_lookup_ttl_ms: 3_600_000,
            cleanup_interval: 60,
        }
    }
}

/// Reads and parses `name`, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
