//! Rate Limit Module
//!
//! Fixed-window, per-client admission control and the axum middleware that applies it.

mod limiter;
mod middleware;
mod window;

pub use limiter::{FailureMode, FixedWindowLimiter, RateLimitConfig, RateLimitError};
pub use middleware::{client_key, enforce_rate_limit, RateLimitState, UNKNOWN_CLIENT};
pub use window::{Decision, RateWindow};
