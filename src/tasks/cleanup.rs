//! Expiry Sweep Task
//!
//! Background task that periodically drops expired entries from an in-memory store.
//! Reads already ignore expired entries; the sweep only reclaims memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::InMemoryStore;

/// Spawns a background task that purges expired entries from `store`.
///
/// `label` names the store in log lines. The returned handle is aborted
/// during graceful shutdown.
pub fn spawn_cleanup_task(
    store: Arc<InMemoryStore>,
    label: &'static str,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            store = label,
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.purge_expired().await;
            if removed > 0 {
                info!(store = label, removed, "expiry sweep removed entries");
            } else {
                debug!(store = label, "expiry sweep found nothing to remove");
            }
        }
    })
}
