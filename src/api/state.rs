//! Application State
//!
//! Everything the handlers and the rate-limit middleware share, and the wiring
//! that builds it from [`Config`].

use std::sync::Arc;

use crate::cache::CacheService;
use crate::config::Config;
use crate::lookup::ThreatLookup;
use crate::rate_limit::{FixedWindowLimiter, RateLimitState};
use crate::store::{CapacityPolicy, InMemoryStore};
use crate::upstream::{FetchError, HttpUrlhausClient, UrlhausApi};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub lookup: Arc<ThreatLookup>,
    /// Limiter for upstream-bound routes
    pub strict: RateLimitState,
    /// Limiter for every other route
    pub general: RateLimitState,
}

impl AppState {
    pub fn new(lookup: ThreatLookup, strict: RateLimitState, general: RateLimitState) -> Self {
        Self {
            lookup: Arc::new(lookup),
            strict,
            general,
        }
    }
}

/// Application state plus the in-memory stores behind it.
///
/// The stores are exposed so the caller can run expiry sweeps over them.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    pub state: AppState,
    /// Holds cached upstream results
    pub cache_store: Arc<InMemoryStore>,
    /// Holds rate-limit counters, so clearing the cache never resets quotas
    pub counter_store: Arc<InMemoryStore>,
}

impl InMemoryBackend {
    /// Wires in-memory stores, both limiters and the cache around `upstream`.
    pub fn new(config: &Config, upstream: Arc<dyn UrlhausApi>) -> Self {
        let cache_store = Arc::new(InMemoryStore::new(config.cache_max_entries));
        let counter_store = Arc::new(
            InMemoryStore::new(config.rate_limit_max_entries)
                .with_capacity_policy(CapacityPolicy::RejectNew),
        );

        let cache = Arc::new(CacheService::new(cache_store.clone()));
        let lookup = ThreatLookup::new(
            upstream,
            cache,
            config.ttl_policy(),
            config.upstream_timeout(),
        );

        let strict = FixedWindowLimiter::new(config.strict_rate_limit(), counter_store.clone());
        let general = FixedWindowLimiter::new(config.general_rate_limit(), counter_store.clone());

        let state = AppState::new(
            lookup,
            RateLimitState::new(Arc::new(strict), config.trust_forwarded_for),
            RateLimitState::new(Arc::new(general), config.trust_forwarded_for),
        );

        Self {
            state,
            cache_store,
            counter_store,
        }
    }

    /// Same wiring with the real URLhaus client.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let client = HttpUrlhausClient::new(config.urlhaus_api_url.clone(), config.upstream_timeout())?;
        Ok(Self::new(config, Arc::new(client)))
    }
}
