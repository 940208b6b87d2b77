//! Rate Window Module
//!
//! Fixed-window arithmetic and the admission decision type.

use serde::Serialize;

// == Rate Window ==
/// The current window of one client, as seen by a limiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindow {
    pub client_key: String,
    /// Start of the window (Unix milliseconds)
    pub window_start: u64,
    /// Requests admitted in this window
    pub count: u32,
}

// == Decision ==
/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed {
        limit: u32,
        remaining: u32,
        /// Seconds until the window resets
        reset_after_secs: u64,
    },
    Rejected {
        limit: u32,
        /// Seconds until the window resets, never zero
        retry_after_secs: u64,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Start of the fixed window containing `now_ms`.
///
/// Windows are aligned to the epoch, so every client shares the same boundaries.
pub fn window_start(now_ms: u64, window_ms: u64) -> u64 {
    let window_ms = window_ms.max(1);
    now_ms - now_ms % window_ms
}

/// Milliseconds from `now_ms` until the window starting at `start_ms` ends.
pub fn remaining_ms(now_ms: u64, start_ms: u64, window_ms: u64) -> u64 {
    start_ms
        .saturating_add(window_ms.max(1))
        .saturating_sub(now_ms)
}

/// Whole seconds until the window resets, rounded up and at least one.
pub fn retry_after_secs(now_ms: u64, start_ms: u64, window_ms: u64) -> u64 {
    remaining_ms(now_ms, start_ms, window_ms).div_ceil(1_000).max(1)
}
