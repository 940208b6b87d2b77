//! Cache Module
//!
//! Read-through caching of upstream results with per-entry TTL.

mod entry;
mod keys;
mod service;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use keys::{normalize_host, normalize_url, CacheKey, TtlPolicy};
pub use service::{CacheService, CacheWriteError, Lookup};
pub use stats::{CacheCounters, CacheStats};
