//! In-Memory Backend
//!
//! Ordered map of entries guarded by an async mutex. Timestamps come from the
//! monotonic tokio clock, so wall-clock jumps never reorder entries.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::policy::{EntryMeta, EvictionPolicy};
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::sweep::{run_sweep, SweepReport, SweepTarget};
use crate::cache::{Cache, CacheEntry, Sweep};
use crate::config::CacheOptions;
use crate::error::Result;

type Entries<V> = BTreeMap<String, CacheEntry<V>>;

// == Memory Cache ==
/// In-process cache with optional TTL and LRU capacity eviction.
///
/// The map lock is held for the whole of each operation, including the sweep
/// that follows a write, so a sweep never interleaves with another access.
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: Mutex<Entries<V>>,
    policy: EvictionPolicy,
    stats: StatsRecorder,
}

impl<V> MemoryCache<V> {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            policy: EvictionPolicy::from_options(&options),
            stats: StatsRecorder::default(),
        }
    }

    /// Number of stored entries, stale ones included until they are swept.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Stored keys in ascending order.
    pub async fn keys(&self) -> Vec<String> {
        self.entries.lock().await.keys().cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

/// Sweep view over a locked map.
struct MemorySweep<'a, V> {
    entries: &'a mut Entries<V>,
}

#[async_trait]
impl<'a, V: Send> SweepTarget for MemorySweep<'a, V> {
    type Timestamp = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn scan(&mut self) -> Result<Vec<EntryMeta<Instant>>> {
        Ok(self
            .entries
            .iter()
            .map(|(key, entry)| EntryMeta {
                key: key.clone(),
                modified_at: entry.modified_at,
                accessed_at: entry.accessed_at,
            })
            .collect())
    }

    async fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[async_trait]
impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + 'static,
{
    // == Get ==
    async fn get(&self, key: &str) -> Result<Option<V>> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(entry) = entries.get_mut(key) else {
            self.stats.record_miss();
            return Ok(None);
        };

        if self.policy.is_stale(entry.modified_at, now) {
            entries.remove(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!(key, "Expired cache entry on read");
            return Ok(None);
        }

        entry.touch(now);
        self.stats.record_hit();
        Ok(Some(entry.value.clone()))
    }

    // == Set ==
    async fn set(&self, key: &str, value: V) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), CacheEntry::new(value, Instant::now()));

        let report = run_sweep(
            &self.policy,
            &mut MemorySweep {
                entries: &mut entries,
            },
        )
        .await?;
        self.stats.record_sweep(&report);
        Ok(())
    }

    // == Delete ==
    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

#[async_trait]
impl<V: Send> Sweep for MemoryCache<V> {
    async fn sweep(&self) -> Result<SweepReport> {
        let mut entries = self.entries.lock().await;
        let report = run_sweep(
            &self.policy,
            &mut MemorySweep {
                entries: &mut entries,
            },
        )
        .await?;
        self.stats.record_sweep(&report);
        Ok(report)
    }
}
