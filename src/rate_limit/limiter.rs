//! Fixed-Window Limiter Module
//!
//! Per-client request quotas counted in an injected [`KeyValueStore`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::rate_limit::window::{self, Decision, RateWindow};
use crate::store::{KeyValueStore, StoreError};

// == Failure Mode ==
/// What a limiter does when its counter store fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Admit the request
    #[default]
    FailOpen,
    /// Refuse the request with an error
    FailClosed,
}

// == Rate Limit Config ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Limiter name, part of every counter key
    pub name: String,
    pub window: Duration,
    /// Requests admitted per client per window
    pub max_requests: u32,
    pub failure_mode: FailureMode,
}

impl RateLimitConfig {
    pub fn new(name: impl Into<String>, window: Duration, max_requests: u32) -> Self {
        Self {
            name: name.into(),
            window,
            max_requests,
            failure_mode: FailureMode::FailOpen,
        }
    }

    pub fn with_failure_mode(mut self, failure_mode: FailureMode) -> Self {
        self.failure_mode = failure_mode;
        self
    }

    /// Limiter guarding upstream-bound routes: 10 requests per 5 minutes.
    pub fn strict() -> Self {
        Self::new("strict", Duration::from_secs(5 * 60), 10)
    }

    /// Limiter for everything else: 100 requests per 15 minutes.
    pub fn general() -> Self {
        Self::new("general", Duration::from_secs(15 * 60), 100)
    }

    fn window_ms(&self) -> u64 {
        u64::try_from(self.window.as_millis())
            .unwrap_or(u64::MAX)
            .max(1)
    }
}

// == Rate Limit Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("rate limiter '{limiter}' unavailable: {source}")]
    Unavailable {
        limiter: String,
        #[source]
        source: StoreError,
    },
}

// == Fixed Window Limiter ==
/// Counts requests per client in fixed, epoch-aligned windows.
///
/// Each admission is a single atomic `incr` on a key scoped to the limiter, the
/// client and the window, so concurrent requests cannot overrun the quota
/// inside one window. A client can still send up to twice the quota across a
/// window boundary.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: RateLimitConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    // == Admit ==
    /// Counts one request from `client_key` and decides whether it may proceed.
    ///
    /// A store failure admits the request in fail-open mode and is returned as
    /// an error in fail-closed mode.
    pub async fn admit(&self, client_key: &str) -> Result<Decision, RateLimitError> {
        let window_ms = self.config.window_ms();
        let limit = self.config.max_requests;
        let now = self.clock.now_ms();
        let start = window::window_start(now, window_ms);
        let remaining_ms = window::remaining_ms(now, start, window_ms);

        let key = self.counter_key(client_key, start);
        let count = match self
            .store
            .incr(&key, Duration::from_millis(remaining_ms))
            .await
        {
            Ok(count) => count,
            Err(e) => return self.on_store_error(client_key, e),
        };

        if count <= u64::from(limit) {
            let remaining = limit - count as u32;
            debug!(
                limiter = %self.config.name,
                client = client_key,
                count,
                remaining,
                "request admitted"
            );
            Ok(Decision::Allowed {
                limit,
                remaining,
                reset_after_secs: remaining_ms.div_ceil(1_000),
            })
        } else {
            let retry_after_secs = window::retry_after_secs(now, start, window_ms);
            debug!(
                limiter = %self.config.name,
                client = client_key,
                retry_after_secs,
                "request rejected"
            );
            Ok(Decision::Rejected {
                limit,
                retry_after_secs,
            })
        }
    }

    // == Window ==
    /// Reports the current window of `client_key` without counting a request.
    pub async fn window(&self, client_key: &str) -> Result<RateWindow, RateLimitError> {
        let window_ms = self.config.window_ms();
        let start = window::window_start(self.clock.now_ms(), window_ms);
        let key = self.counter_key(client_key, start);

        let raw = self.store.get(&key).await.map_err(|source| self.unavailable(source))?;
        let attempts = match raw {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| self.unavailable(StoreError::NotAnInteger(key.clone())))?,
            None => 0,
        };

        Ok(RateWindow {
            client_key: client_key.to_string(),
            window_start: start,
            // Rejected attempts are counted in the store but were never admitted
            count: attempts.min(u64::from(self.config.max_requests)) as u32,
        })
    }

    fn counter_key(&self, client_key: &str, window_start: u64) -> String {
        format!("rl:{}:{}:{}", self.config.name, client_key, window_start)
    }

    fn unavailable(&self, source: StoreError) -> RateLimitError {
        RateLimitError::Unavailable {
            limiter: self.config.name.clone(),
            source,
        }
    }

    fn on_store_error(
        &self,
        client_key: &str,
        error: StoreError,
    ) -> Result<Decision, RateLimitError> {
        match self.config.failure_mode {
            FailureMode::FailOpen => {
                warn!(
                    limiter = %self.config.name,
                    client = client_key,
                    error = %error,
                    "counter store failed, admitting request"
                );
                Ok(Decision::Allowed {
                    limit: self.config.max_requests,
                    remaining: self.config.max_requests,
                    reset_after_secs: self.config.window_ms().div_ceil(1_000),
                })
            }
            FailureMode::FailClosed => {
                warn!(
                    limiter = %self.config.name,
                    client = client_key,
                    error = %error,
                    "counter store failed, refusing request"
                );
                Err(self.unavailable(error))
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{CapacityPolicy, InMemoryStore, StoreResult};
    use async_trait::async_trait;
    use proptest::prelude::*;

    const FIVE_MIN_MS: u64 = 300_000;
    // Aligned to a 5 and a 15 minute boundary
    const START_MS: u64 = 1_699_999_200_000;

    #[derive(Debug)]
    struct DownStore;

    #[async_trait]
    impl KeyValueStore for DownStore {
        fn backend_name(&self) -> &'static str {
            "down"
        }
        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Unavailable("timeout".into()))
        }
        async fn set(&self, _: &str, _: String, _: Option<Duration>) -> StoreResult<()> {
            Err(StoreError::Unavailable("timeout".into()))
        }
        async fn del(&self, _key: &str) -> StoreResult<bool> {
            Err(StoreError::Unavailable("timeout".into()))
        }
        async fn incr(&self, _key: &str, _ttl: Duration) -> StoreResult<u64> {
            Err(StoreError::Unavailable("timeout".into()))
        }
        async fn flush(&self) -> StoreResult<()> {
            Err(StoreError::Unavailable("timeout".into()))
        }
        async fn len(&self) -> StoreResult<usize> {
            Err(StoreError::Unavailable("timeout".into()))
        }
    }

    fn limiter(config: RateLimitConfig) -> (FixedWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START_MS));
        let store = Arc::new(InMemoryStore::with_clock(1_000, clock.clone()));
        (FixedWindowLimiter::with_clock(config, store, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_eleventh_request_is_rejected() {
        let (limiter, _) = limiter(RateLimitConfig::strict());

        for i in 1..=10u32 {
            let decision = limiter.admit("10.0.0.1").await.unwrap();
            assert_eq!(
                decision,
                Decision::Allowed {
                    limit: 10,
                    remaining: 10 - i,
                    reset_after_secs: 300,
                },
                "request {} should be allowed",
                i
            );
        }

        match limiter.admit("10.0.0.1").await.unwrap() {
            Decision::Rejected {
                limit,
                retry_after_secs,
            } => {
                assert_eq!(limit, 10);
                assert!(retry_after_secs > 0);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(limiter.window("10.0.0.1").await.unwrap().count, 10);
    }

    #[tokio::test]
    async fn test_retry_after_counts_down_to_window_end() {
        let config = RateLimitConfig::new("t", Duration::from_millis(FIVE_MIN_MS), 1);
        let (limiter, clock) = limiter(config);

        limiter.admit("c").await.unwrap();
        clock.advance(120_500);

        assert_eq!(
            limiter.admit("c").await.unwrap(),
            Decision::Rejected {
                limit: 1,
                retry_after_secs: 180,
            }
        );
    }

    #[tokio::test]
    async fn test_window_reset_restores_quota() {
        let (limiter, clock) = limiter(RateLimitConfig::strict());

        for _ in 0..11 {
            limiter.admit("c").await.unwrap();
        }
        clock.advance(FIVE_MIN_MS);

        assert!(limiter.admit("c").await.unwrap().is_allowed());
        let window = limiter.window("c").await.unwrap();
        assert_eq!(window.count, 1);
        assert_eq!(window.window_start, START_MS + FIVE_MIN_MS);
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let (limiter, _) = limiter(RateLimitConfig::new("t", Duration::from_secs(60), 2));

        limiter.admit("a").await.unwrap();
        limiter.admit("a").await.unwrap();
        assert!(!limiter.admit("a").await.unwrap().is_allowed());

        assert!(limiter.admit("b").await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_limiters_sharing_a_store_are_independent() {
        let clock = Arc::new(ManualClock::new(START_MS));
        let store: Arc<dyn KeyValueStore> =
            Arc::new(InMemoryStore::with_clock(1_000, clock.clone()));
        let strict =
            FixedWindowLimiter::with_clock(RateLimitConfig::strict(), store.clone(), clock.clone());
        let general =
            FixedWindowLimiter::with_clock(RateLimitConfig::general(), store, clock.clone());

        for _ in 0..10 {
            assert!(strict.admit("c").await.unwrap().is_allowed());
        }
        assert!(!strict.admit("c").await.unwrap().is_allowed());

        for i in 1..=100u32 {
            assert!(
                general.admit("c").await.unwrap().is_allowed(),
                "general request {} rejected",
                i
            );
        }
        assert!(!general.admit("c").await.unwrap().is_allowed());
        assert_eq!(strict.window("c").await.unwrap().count, 10);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_never_exceed_quota() {
        let (limiter, _) = limiter(RateLimitConfig::strict());
        let limiter = Arc::new(limiter);

        let mut handles = Vec::new();
        for _ in 0..50 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.admit("burst").await }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_allowed() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
    }

    #[tokio::test]
    async fn test_full_counter_store_keeps_exhausted_clients_rejected() {
        let clock = Arc::new(ManualClock::new(START_MS));
        let store = Arc::new(
            InMemoryStore::with_clock(100, clock.clone())
                .with_capacity_policy(CapacityPolicy::RejectNew),
        );
        let limiter = FixedWindowLimiter::with_clock(RateLimitConfig::strict(), store, clock);

        for _ in 0..10 {
            assert!(limiter.admit("victim").await.unwrap().is_allowed());
        }
        assert!(!limiter.admit("victim").await.unwrap().is_allowed());

        // Enough newcomers to fill the store and then some
        for i in 0..150 {
            limiter.admit(&format!("client-{}", i)).await.unwrap();
        }

        assert!(!limiter.admit("victim").await.unwrap().is_allowed());
        assert_eq!(limiter.window("victim").await.unwrap().count, 10);
    }

    #[tokio::test]
    async fn test_full_counter_store_fails_closed_for_newcomers() {
        let clock = Arc::new(ManualClock::new(START_MS));
        let store = Arc::new(
            InMemoryStore::with_clock(1, clock.clone())
                .with_capacity_policy(CapacityPolicy::RejectNew),
        );
        let config = RateLimitConfig::strict().with_failure_mode(FailureMode::FailClosed);
        let limiter = FixedWindowLimiter::with_clock(config, store, clock);

        assert!(limiter.admit("first").await.unwrap().is_allowed());
        let err = limiter.admit("second").await.unwrap_err();
        assert!(matches!(
            err,
            RateLimitError::Unavailable {
                source: StoreError::Full(1),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_boundary_burst_is_bounded_by_twice_the_quota() {
        let (limiter, clock) = limiter(RateLimitConfig::strict());

        clock.advance(FIVE_MIN_MS - 1);
        let mut allowed = 0;
        for _ in 0..15 {
            if limiter.admit("c").await.unwrap().is_allowed() {
                allowed += 1;
            }
        }
        clock.advance(1);
        for _ in 0..15 {
            if limiter.admit("c").await.unwrap().is_allowed() {
                allowed += 1;
            }
        }

        // Two milliseconds apart, yet two full quotas went through
        assert_eq!(allowed, 20);
    }

    #[tokio::test]
    async fn test_fail_open_admits_on_store_error() {
        let limiter = FixedWindowLimiter::new(RateLimitConfig::strict(), Arc::new(DownStore));

        for _ in 0..20 {
            assert!(limiter.admit("c").await.unwrap().is_allowed());
        }
    }

    #[tokio::test]
    async fn test_fail_closed_surfaces_store_error() {
        let config = RateLimitConfig::strict().with_failure_mode(FailureMode::FailClosed);
        let limiter = FixedWindowLimiter::new(config, Arc::new(DownStore));

        let err = limiter.admit("c").await.unwrap_err();
        assert!(matches!(err, RateLimitError::Unavailable { ref limiter, .. } if limiter == "strict"));
        assert!(limiter.window("c").await.is_err());
    }

    #[tokio::test]
    async fn test_window_of_unknown_client_is_empty() {
        let (limiter, _) = limiter(RateLimitConfig::strict());

        let window = limiter.window("nobody").await.unwrap();
        assert_eq!(window.count, 0);
        assert_eq!(window.window_start, START_MS);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        // Exactly `max` admissions per window, then rejections with a positive retry hint.
        #[test]
        fn prop_quota_is_exact(max in 1u32..40, window_secs in 1u64..3_600, offset_ms in 0u64..3_600_000) {
            let config = RateLimitConfig::new("p", Duration::from_secs(window_secs), max);
            let (limiter, clock) = limiter(config);
            // Stay inside one window
            let window_ms = window_secs * 1_000;
            clock.set(window::window_start(START_MS, window_ms) + offset_ms % window_ms);

            tokio_test::block_on(async {
                for _ in 0..max {
                    prop_assert!(limiter.admit("c").await.unwrap().is_allowed());
                }
                match limiter.admit("c").await.unwrap() {
                    Decision::Rejected { retry_after_secs, .. } => {
                        prop_assert!(retry_after_secs >= 1);
                        prop_assert!(retry_after_secs <= window_secs);
                    }
                    other => prop_assert!(false, "expected rejection, got {:?}", other),
                }
                Ok(())
            })?;
        }
    }
}
