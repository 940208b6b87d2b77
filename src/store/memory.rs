//! In-Memory Store Module
//!
//! HashMap-backed [`KeyValueStore`] with lazy TTL expiry and a capacity policy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::store::{
    KeyValueStore, LruTracker, StoreError, StoreResult, StoredValue, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};

// == Capacity Policy ==
/// What a full store does with a new key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Evict the least recently used key. Suits caches, where a lost entry is a miss.
    #[default]
    EvictLru,
    /// Drop expired keys, then refuse the new key with [`StoreError::Full`].
    /// Existing keys are never displaced, which counters depend on.
    RejectNew,
}

// == Store Stats ==
/// Point-in-time view of the in-memory store.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    /// Keys currently held, including expired keys not yet purged
    pub entries: usize,
    /// Keys dropped by the capacity policy
    pub evictions: u64,
    pub max_entries: usize,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, StoredValue>,
    lru: LruTracker,
    evictions: u64,
}

impl Inner {
    /// Drops `key` if it has expired. Returns whether a live value remains.
    fn retain_live(&mut self, key: &str, now: u64) -> bool {
        match self.entries.get(key) {
            Some(stored) if stored.is_expired_at(now) => {
                self.entries.remove(key);
                self.lru.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    fn purge_expired(&mut self, now: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, stored)| stored.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        expired.len()
    }

    /// Makes room for one more key according to `policy`.
    fn reserve_slot(
        &mut self,
        max_entries: usize,
        policy: CapacityPolicy,
        now: u64,
    ) -> StoreResult<()> {
        if self.entries.len() < max_entries {
            return Ok(());
        }

        match policy {
            CapacityPolicy::EvictLru => {
                while self.entries.len() >= max_entries {
                    match self.lru.evict_oldest() {
                        Some(evicted) => {
                            self.entries.remove(&evicted);
                            self.evictions += 1;
                            debug!(key = %evicted, "evicted least recently used key");
                        }
                        None => break,
                    }
                }
                Ok(())
            }
            CapacityPolicy::RejectNew => {
                self.purge_expired(now);
                if self.entries.len() >= max_entries {
                    return Err(StoreError::Full(max_entries));
                }
                Ok(())
            }
        }
    }

    fn insert(
        &mut self,
        key: &str,
        stored: StoredValue,
        max_entries: usize,
        policy: CapacityPolicy,
    ) -> StoreResult<()> {
        if !self.entries.contains_key(key) {
            self.reserve_slot(max_entries, policy, stored.written_at)?;
        }
        self.entries.insert(key.to_string(), stored);
        self.lru.touch(key);
        Ok(())
    }
}

// == In-Memory Store ==
/// Process-local key-value store.
///
/// All state sits behind one async mutex, so every trait operation is atomic.
/// Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    max_entries: usize,
    policy: CapacityPolicy,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` keys, using the system clock.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_entries: max_entries.max(1),
            policy: CapacityPolicy::default(),
            clock,
        }
    }

    /// Replaces the default LRU eviction.
    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.policy = policy;
        self
    }

    // == Purge Expired ==
    /// Removes every expired key. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        self.inner.lock().await.purge_expired(now)
    }

    // == Stats ==
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.lock().await;
        StoreStats {
            entries: inner.entries.len(),
            evictions: inner.evictions,
            max_entries: self.max_entries,
        }
    }

    /// Remaining native TTL of `key`, or None if the key is absent or has no expiry.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().await;
        if !inner.retain_live(key, now) {
            return None;
        }
        inner
            .entries
            .get(key)
            .and_then(|stored| stored.ttl_remaining_ms(now))
            .map(Duration::from_millis)
    }

    fn check_key(key: &str) -> StoreResult<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(StoreError::KeyTooLong);
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().await;

        if !inner.retain_live(key, now) {
            return Ok(None);
        }
        inner.lru.touch(key);
        Ok(inner.entries.get(key).map(|stored| stored.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        Self::check_key(key)?;
        if value.len() > MAX_VALUE_SIZE {
            return Err(StoreError::ValueTooLarge);
        }

        let now = self.clock.now_ms();
        let ttl_ms = ttl.map(duration_to_ms);
        let mut inner = self.inner.lock().await;
        inner.insert(
            key,
            StoredValue::new(value, now, ttl_ms),
            self.max_entries,
            self.policy,
        )
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().await;

        let live = inner.retain_live(key, now);
        if live {
            inner.entries.remove(key);
            inner.lru.remove(key);
        }
        Ok(live)
    }

    async fn incr(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        Self::check_key(key)?;
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().await;

        if inner.retain_live(key, now) {
            let stored = inner
                .entries
                .get_mut(key)
                .ok_or_else(|| StoreError::Unavailable(format!("lost key '{}'", key)))?;
            let next = stored
                .value
                .parse::<u64>()
                .map_err(|_| StoreError::NotAnInteger(key.to_string()))?
                .saturating_add(1);
            stored.value = next.to_string();
            inner.lru.touch(key);
            return Ok(next);
        }

        let stored = StoredValue::new("1".to_string(), now, Some(duration_to_ms(ttl)));
        inner.insert(key, stored, self.max_entries, self.policy)?;
        Ok(1)
    }

    async fn flush(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.lru.clear();
        Ok(())
    }

    async fn len(&self) -> StoreResult<usize> {
        let now = self.clock.now_ms();
        let inner = self.inner.lock().await;
        Ok(inner
            .entries
            .values()
            .filter(|stored| !stored.is_expired_at(now))
            .count())
    }
}

fn duration_to_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}
