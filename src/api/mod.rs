//! API Module
//!
//! HTTP handlers, state and routing for the proxy REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /api/v1/recent` - Recent malicious URLs
//! - `POST /api/v1/search/url` - Look up a URL
//! - `POST /api/v1/search/host` - Look up a host
//! - `GET /api/v1/detail/*url` - URL details
//! - `POST /api/v1/cache/clear` - Clear the cache
//! - `GET /api/v1/cache/stats` - Cache statistics

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthKey, AUTH_KEY_HEADER};
pub use handlers::*;
pub use routes::create_router;
pub use state::{AppState, InMemoryBackend};
