//! Cache Module
//!
//! The four-operation cache contract, the shared eviction policy, and the two
//! backends implementing it: an in-process map and a directory of files.

mod entry;
pub mod fs;
mod memory;
pub mod policy;
mod stats;
pub mod sweep;


use async_trait::async_trait;

use crate::error::Result;

// Re-export public types
pub use entry::CacheEntry;
pub use fs::{FileSystem, FileTimes, FsCache, LocalFs};
pub use memory::MemoryCache;
pub use policy::{EntryMeta, EvictionPolicy, Removal, RemovalCause, Timestamp};
pub use stats::CacheStats;
pub use sweep::{run_sweep, SweepReport, SweepTarget};

// == Cache Contract ==
/// Abstract key-value cache.
///
/// TTL and capacity guarantees belong to the concrete backend and its
/// options, not to this trait. A miss is `Ok(None)`, never an error.
#[async_trait]
pub trait Cache<V>: Send + Sync {
    /// Returns the stored value, or `None` if absent or stale.
    ///
    /// A stale entry is removed before returning.
    async fn get(&self, key: &str) -> Result<Option<V>>;

    /// Stores or overwrites a value, then sweeps the store.
    async fn set(&self, key: &str, value: V) -> Result<()>;

    /// Removes one entry. Removing an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every entry and resets any lazily created backing storage.
    async fn delete_all(&self) -> Result<()>;
}

/// A cache that can run its eviction sweep on demand.
#[async_trait]
pub trait Sweep: Send + Sync {
    /// Applies TTL and capacity eviction across the whole store.
    async fn sweep(&self) -> Result<SweepReport>;
}
