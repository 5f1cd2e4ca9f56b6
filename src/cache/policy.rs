//! Eviction Policy Module
//!
//! Pure TTL + capacity planning shared by every backend. The policy only looks
//! at timestamps and returns the keys to remove; it never touches storage.

use std::time::{Duration, SystemTime};

use crate::config::CacheOptions;

// == Timestamp ==
/// A point in time a backend can report for an entry.
pub trait Timestamp: Copy + Ord + Send + Sync + 'static {
    /// Time elapsed from `self` until `now`. Never negative.
    fn age(self, now: Self) -> Duration;
}

impl Timestamp for tokio::time::Instant {
    fn age(self, now: Self) -> Duration {
        now.saturating_duration_since(self)
    }
}

impl Timestamp for SystemTime {
    fn age(self, now: Self) -> Duration {
        // A timestamp ahead of `now` (clock skew, touched by another host) counts as fresh.
        now.duration_since(self).unwrap_or(Duration::ZERO)
    }
}

// == Entry Metadata ==
/// Timestamps of one stored entry, as seen by a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta<T> {
    pub key: String,
    /// Last write
    pub modified_at: T,
    /// Last successful read (or write)
    pub accessed_at: T,
}

/// Why an entry was selected for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// Older than the TTL
    Expired,
    /// Beyond capacity after expired entries were set aside
    Evicted,
}

/// A key selected for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub key: String,
    pub cause: RemovalCause,
}

// == Eviction Policy ==
/// TTL and capacity limits applied by a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    ttl: Option<Duration>,
    max_size: Option<usize>,
}

impl EvictionPolicy {
    pub fn new(ttl: Option<Duration>, max_size: Option<usize>) -> Self {
        Self::from_options(&CacheOptions { ttl, max_size })
    }

    /// Builds a policy from cache options, treating zero limits as disabled.
    pub fn from_options(options: &CacheOptions) -> Self {
        Self {
            ttl: options.ttl.filter(|ttl| !ttl.is_zero()),
            max_size: options.max_size.filter(|&size| size > 0),
        }
    }

    /// Returns false when neither limit is configured.
    pub fn is_active(&self) -> bool {
        self.ttl.is_some() || self.max_size.is_some()
    }

    /// Checks whether an entry written at `modified_at` is stale at `now`.
    ///
    /// Boundary condition: an entry is stale once its age reaches the TTL
    /// (`age >= ttl`). Without a TTL nothing is ever stale.
    pub fn is_stale<T: Timestamp>(&self, modified_at: T, now: T) -> bool {
        match self.ttl {
            Some(ttl) => modified_at.age(now) >= ttl,
            None => false,
        }
    }

    // == Plan ==
    /// Selects the entries a sweep must remove.
    ///
    /// 1. Every stale entry is marked `Expired`.
    /// 2. The remaining entries are stable-sorted by `accessed_at`, most recent
    ///    first, and everything past `max_size` is marked `Evicted`.
    ///
    /// Expired entries never take part in the capacity ordering, so a key
    /// appears at most once in the result. Ties keep the input order.
    pub fn plan<T: Timestamp>(&self, entries: Vec<EntryMeta<T>>, now: T) -> Vec<Removal> {
        if !self.is_active() {
            return Vec::new();
        }

        let (stale, mut live): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| self.is_stale(entry.modified_at, now));

        let mut removals: Vec<Removal> = stale
            .into_iter()
            .map(|entry| Removal {
                key: entry.key,
                cause: RemovalCause::Expired,
            })
            .collect();

        if let Some(max_size) = self.max_size {
            if live.len() > max_size {
                live.sort_by(|a, b| b.accessed_at.cmp(&a.accessed_at));
                removals.extend(live.into_iter().skip(max_size).map(|entry| Removal {
                    key: entry.key,
                    cause: RemovalCause::Evicted,
                }));
            }
        }

        removals
    }
}
