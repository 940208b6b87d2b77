//! Cache Service Module
//!
//! Read-through cache over an injected [`KeyValueStore`]. Storage failures never
//! escape this module: reads degrade to a miss and writes are dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheCounters, CacheEntry, CacheStats};
use crate::clock::{Clock, SystemClock};
use crate::store::{KeyValueStore, StoreError};

// == Lookup ==
/// Outcome of a cache read before it is collapsed for callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// A valid entry was found
    Hit(T),
    /// No entry, an expired entry, or an undecodable entry
    Miss,
    /// The backing store could not answer
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Unavailable => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

// == Cache Write Error ==
#[derive(Error, Debug)]
pub enum CacheWriteError {
    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// == Cache Service ==
/// TTL-aware cache of upstream results.
#[derive(Debug)]
pub struct CacheService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    counters: CacheCounters,
}

impl CacheService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            counters: CacheCounters::new(),
        }
    }

    // == Lookup ==
    /// Reads `key`, telling a plain miss apart from an unreachable store.
    ///
    /// Expired and undecodable entries are deleted and reported as misses.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.counters.record_miss();
                debug!(key, "cache miss");
                return Lookup::Miss;
            }
            Err(e) => {
                self.counters.record_unavailable();
                warn!(key, error = %e, "cache read failed, treating as miss");
                return Lookup::Unavailable;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                self.discard(key).await;
                self.counters.record_miss();
                return Lookup::Miss;
            }
        };

        if !entry.is_valid_at(self.clock.now_ms()) {
            debug!(key, "cache entry expired");
            self.discard(key).await;
            self.counters.record_expired();
            return Lookup::Miss;
        }

        self.counters.record_hit();
        debug!(key, "cache hit");
        Lookup::Hit(entry.data)
    }

    // == Get ==
    /// Returns the cached value for `key`, or `None` on any kind of miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).await.into_option()
    }

    // == Store ==
    /// Writes `value` under `key` with `storedAt = now`, reporting any failure.
    pub async fn store<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheWriteError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);
        let raw = serde_json::to_string(&entry)?;

        self.store.set(key, raw, Some(ttl)).await?;
        self.counters.record_write();
        Ok(())
    }

    // == Set ==
    /// Writes `value` under `key`; a failed write is logged and dropped.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Err(e) = self.store(key, value, ttl).await {
            self.counters.record_dropped_write();
            warn!(key, error = %e, "cache write dropped");
        }
    }

    // == Invalidate ==
    /// Removes a single entry. Absent keys and store errors are ignored.
    pub async fn invalidate(&self, key: &str) {
        self.discard(key).await;
    }

    // == Clear ==
    /// Removes every entry in the backing store.
    pub async fn clear(&self) {
        match self.store.flush().await {
            Ok(()) => debug!(backend = self.store.backend_name(), "cache cleared"),
            Err(e) => warn!(error = %e, "cache clear failed"),
        }
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Live entries in the backing store, if it can say.
    pub async fn entry_count(&self) -> Option<usize> {
        self.store.len().await.ok()
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.store.del(key).await {
            warn!(key, error = %e, "cache delete failed");
        }
    }
}
