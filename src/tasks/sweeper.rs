//! Periodic Sweep Task
//!
//! Background task that sweeps a cache at a fixed interval, in addition to
//! the sweep every `set` already runs. Useful for caches that are read far
//! more often than written, where stale entries would otherwise linger.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::Sweep;

/// Spawns a background task that sweeps `cache` every `interval`.
///
/// A failed sweep is logged and retried on the next tick; the task only stops
/// when the returned handle is aborted.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(MemoryCache::<String>::new(options));
/// let handle = spawn_sweep_task(cache.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task<S>(cache: Arc<S>, interval: Duration) -> JoinHandle<()>
where
    S: Sweep + ?Sized + 'static,
{
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            match cache.sweep().await {
                Ok(report) if report.removed() > 0 => info!(
                    expired = report.expired,
                    evicted = report.evicted,
                    "Periodic sweep removed entries"
                ),
                Ok(_) => debug!("Periodic sweep found nothing to remove"),
                Err(e) => warn!(error = %e, "Periodic sweep failed"),
            }
        }
    })
}
