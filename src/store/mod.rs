//! Store Module
//!
//! The key-value store seam that sits under the cache service and the rate limiter,
//! plus the in-memory backend shipped with the proxy.

mod entry;
mod lru;
mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use entry::StoredValue;
pub use lru::LruTracker;
pub use memory::{CapacityPolicy, InMemoryStore, StoreStats};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 8 * 1024 * 1024; // 8 MB

// == Store Error ==
/// Errors raised by a backing store.
///
/// Callers decide whether to absorb them: the cache always does, the rate limiter
/// does unless it is configured to fail closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached or refused the command
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A new key was refused because the store is at capacity
    #[error("store is full ({0} keys)")]
    Full(usize),

    /// INCR against a value that is not an integer
    #[error("value at '{0}' is not an integer")]
    NotAnInteger(String),

    #[error("key exceeds maximum length of {MAX_KEY_LENGTH} bytes")]
    KeyTooLong,

    #[error("value exceeds maximum size of {MAX_VALUE_SIZE} bytes")]
    ValueTooLarge,
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Key Value Store ==
/// Minimal string key-value interface with native expiry.
///
/// Each method is a single-key operation and must be atomic on its own;
/// nothing in the proxy needs multi-key transactions.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug + 'static {
    /// Backend name, for logging.
    fn backend_name(&self) -> &'static str;

    /// Returns the value at `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` at `key`, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()>;

    /// Removes `key`. Returns whether anything was removed.
    async fn del(&self, key: &str) -> StoreResult<bool>;

    /// Atomically increments the integer at `key` and returns the new value.
    ///
    /// A missing key starts from zero and receives `ttl`; an existing key keeps its expiry.
    async fn incr(&self, key: &str, ttl: Duration) -> StoreResult<u64>;

    /// Removes every key.
    async fn flush(&self) -> StoreResult<()>;

    /// Number of live keys.
    async fn len(&self) -> StoreResult<usize>;
}
