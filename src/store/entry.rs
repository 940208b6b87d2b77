//! Stored Value Module
//!
//! A raw value held by the in-memory store together with its native expiry.

// == Stored Value ==
/// A single value in the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    /// The stored value
    pub value: String,
    /// Write timestamp (Unix milliseconds)
    pub written_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredValue {
    // == Constructor ==
    /// Creates a value written at `now_ms`, expiring `ttl_ms` later if a TTL is given.
    pub fn new(value: String, now_ms: u64, ttl_ms: Option<u64>) -> Self {
        Self {
            value,
            written_at: now_ms,
            expires_at: ttl_ms.map(|ttl| now_ms.saturating_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks whether the value has expired at `now_ms`.
    ///
    /// A value stays readable up to and including `expires_at`, so a zero TTL is
    /// readable within the millisecond it was written.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        matches!(self.expires_at, Some(expires) if now_ms > expires)
    }

    // == Time To Live ==
    /// Remaining TTL in milliseconds at `now_ms`, or None if no expiry is set.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now_ms))
    }
}
