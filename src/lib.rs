//! URLhaus Proxy - A caching, rate-limited gateway to the URLhaus threat feed
//!
//! Forwards lookups to URLhaus with the caller's key, caches successful answers
//! with per-query TTLs, and enforces fixed-window quotas per client.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod rate_limit;
pub mod store;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState, InMemoryBackend};
pub use config::Config;
pub use error::{ProxyError, Result};
pub use lookup::ThreatLookup;
pub use tasks::spawn_cleanup_task;
