//! Configuration Module
//!
//! Cache options shared by every backend, loadable from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::policy::EvictionPolicy;
use crate::error::{CacheError, Result};

/// Environment variable holding the TTL in milliseconds.
pub const ENV_TTL_MS: &str = "CACHE_TTL_MS";
/// Environment variable holding the maximum entry count.
pub const ENV_MAX_SIZE: &str = "CACHE_MAX_SIZE";

/// Eviction options for a cache instance.
///
/// Both limits are optional. With neither set the cache never evicts and the
/// post-write sweep is skipped entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum age of an entry, counted from its last write
    pub ttl: Option<Duration>,
    /// Maximum number of entries kept after a sweep
    pub max_size: Option<usize>,
}

impl CacheOptions {
    /// Creates options with no TTL and no capacity limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL. A zero duration disables expiry.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Sets the capacity. Zero disables capacity eviction.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = (max_size > 0).then_some(max_size);
        self
    }

    /// Returns true if a sweep has anything to enforce.
    pub fn has_eviction(&self) -> bool {
        EvictionPolicy::from_options(self).is_active()
    }

    /// Loads options from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MS` - TTL in milliseconds (default: disabled)
    /// - `CACHE_MAX_SIZE` - Maximum entry count (default: disabled)
    ///
    /// Unset variables keep the default; a value that does not parse is an error.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();
        if let Some(ms) = read_env::<u64>(ENV_TTL_MS)? {
            options = options.with_ttl(Duration::from_millis(ms));
        }
        if let Some(size) = read_env::<usize>(ENV_MAX_SIZE)? {
            options = options.with_max_size(size);
        }
        Ok(options)
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CacheError::InvalidConfig(format!("{name}={raw:?} is not a valid number"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(CacheError::InvalidConfig(format!("{name} is not valid unicode")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = CacheOptions::default();
        assert_eq!(options.ttl, None);
        assert_eq!(options.max_size, None);
        assert!(!options.has_eviction());
    }

    #[test]
    fn test_zero_values_disable_limits() {
        let options = CacheOptions::new()
            .with_ttl(Duration::ZERO)
            .with_max_size(0);
        assert_eq!(options, CacheOptions::default());
    }

    #[test]
    fn test_builder_sets_limits() {
        let options = CacheOptions::new()
            .with_ttl(Duration::from_millis(10))
            .with_max_size(3);
        assert_eq!(options.ttl, Some(Duration::from_millis(10)));
        assert_eq!(options.max_size, Some(3));
        assert!(options.has_eviction());
    }

    // Both env cases live in one test so they cannot race each other.
    #[test]
    fn test_options_from_env() {
        env::remove_var(ENV_TTL_MS);
        env::remove_var(ENV_MAX_SIZE);
        assert_eq!(CacheOptions::from_env().unwrap(), CacheOptions::default());

        env::set_var(ENV_TTL_MS, "250");
        env::set_var(ENV_MAX_SIZE, "8");
        let options = CacheOptions::from_env().unwrap();
        assert_eq!(options.ttl, Some(Duration::from_millis(250)));
        assert_eq!(options.max_size, Some(8));

        env::set_var(ENV_MAX_SIZE, "lots");
        assert!(matches!(
            CacheOptions::from_env(),
            Err(CacheError::InvalidConfig(_))
        ));

        env::remove_var(ENV_TTL_MS);
        env::remove_var(ENV_MAX_SIZE);
    }
}
