//! Periodic Cleanup Task
//!
//! Background task that periodically removes expired and corrupt cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::DiskStore;

/// Spawns a background task that runs a cleanup pass every `interval`.
///
/// The task sleeps first, so no pass runs at spawn time. Each pass runs on the
/// blocking pool and holds the store's write lock for its whole duration;
/// aborting the returned handle mid-pass stops the loop, but the pass itself
/// still runs to completion.
///
/// # Arguments
/// * `store` - shared reference to the disk store
/// * `interval` - time between cleanup passes
///
/// # Returns
/// A JoinHandle for the spawned task, which the owner aborts on close.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(DiskStore::new(&config, Arc::new(SystemClock))));
/// let cleanup_handle = spawn_cleanup_task(store.clone(), Duration::from_secs(3600));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<RwLock<DiskStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let pass_store = store.clone();
            let result =
                tokio::task::spawn_blocking(move || pass_store.blocking_write().cleanup()).await;

            match result {
                Ok(Ok(report)) if report.removed + report.corrupt > 0 => debug!(
                    "Periodic cleanup freed {} bytes from {} entries",
                    report.freed,
                    report.removed + report.corrupt
                ),
                Ok(Ok(_)) => debug!("Periodic cleanup: nothing to remove"),
                // The next tick retries; the last persisted stats stay authoritative
                Ok(Err(e)) => warn!("Periodic cache cleanup failed: {}", e),
                Err(e) => warn!("Periodic cache cleanup worker failed: {}", e),
            }
        }
    })
}
