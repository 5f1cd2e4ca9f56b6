//! Cache Entry Module
//!
//! In-memory entry with the write and access timestamps the policy reads.

use tokio::time::Instant;

// == Cache Entry ==
/// A single value held by the in-memory backend.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Last write (monotonic)
    pub modified_at: Instant,
    /// Last successful read or write (monotonic)
    pub accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry written and accessed at `now`.
    pub fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            modified_at: now,
            accessed_at: now,
        }
    }

    // == Touch ==
    /// Records a successful read at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.accessed_at = now;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("test_value".to_string(), now);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.modified_at, now);
        assert_eq!(entry.accessed_at, now);
    }

    #[test]
    fn test_touch_only_moves_access_time() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(42u32, now);

        let later = now + Duration::from_millis(3);
        entry.touch(later);

        assert_eq!(entry.modified_at, now);
        assert_eq!(entry.accessed_at, later);
    }
}
