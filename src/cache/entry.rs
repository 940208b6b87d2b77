//! Cache Entry Module
//!
//! The serialized form of a cached upstream result: `{"data", "storedAt", "ttl"}`.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached payload with the metadata needed for the lazy TTL check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Time-to-live in milliseconds
    pub ttl: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, stored_at: u64, ttl: u64) -> Self {
        Self {
            data,
            stored_at,
            ttl,
        }
    }

    // == Is Valid ==
    /// An entry is valid while `now - storedAt <= ttl`.
    ///
    /// A clock that moved backwards past `storedAt` keeps the entry valid.
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at) <= self.ttl
    }

    /// Milliseconds of validity left at `now_ms`.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.stored_at
            .saturating_add(self.ttl)
            .saturating_sub(now_ms)
    }
}
