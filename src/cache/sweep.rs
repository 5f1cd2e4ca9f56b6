//! Sweep Driver
//!
//! Runs the eviction policy against a backend. Backends only describe how to
//! list their entries and how to remove one; the algorithm lives here once.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::policy::{EntryMeta, EvictionPolicy, RemovalCause, Timestamp};
use crate::error::Result;

// == Sweep Target ==
/// Storage a sweep can enumerate and prune.
#[async_trait]
pub trait SweepTarget: Send {
    type Timestamp: Timestamp;

    /// Current time on the clock the stored timestamps come from.
    fn now(&self) -> Self::Timestamp;

    /// Lists every entry with its timestamps.
    ///
    /// Entries that disappear while being listed are left out, not reported
    /// as errors.
    async fn scan(&mut self) -> Result<Vec<EntryMeta<Self::Timestamp>>>;

    /// Removes one entry. Removing an entry that is already gone succeeds.
    async fn remove(&mut self, key: &str) -> Result<()>;
}

// == Sweep Report ==
/// Outcome of a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries examined
    pub scanned: usize,
    /// Entries removed for exceeding the TTL
    pub expired: usize,
    /// Entries removed for exceeding capacity
    pub evicted: usize,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.expired + self.evicted
    }
}

/// Applies `policy` to everything in `target`.
///
/// An inactive policy returns immediately without listing the store.
pub async fn run_sweep<S>(policy: &EvictionPolicy, target: &mut S) -> Result<SweepReport>
where
    S: SweepTarget + ?Sized,
{
    if !policy.is_active() {
        return Ok(SweepReport::default());
    }

    let entries = target.scan().await?;
    let scanned = entries.len();
    let now = target.now();
    let removals = policy.plan(entries, now);

    let mut report = SweepReport {
        scanned,
        ..SweepReport::default()
    };
    for removal in removals {
        target.remove(&removal.key).await?;
        match removal.cause {
            RemovalCause::Expired => report.expired += 1,
            RemovalCause::Evicted => report.evicted += 1,
        }
        debug!(key = %removal.key, cause = ?removal.cause, "Removed cache entry");
    }

    if report.removed() > 0 {
        info!(
            scanned = report.scanned,
            expired = report.expired,
            evicted = report.evicted,
            "Sweep removed cache entries"
        );
    }
    Ok(report)
}
