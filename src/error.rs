//! Error types for the cache
//!
//! Provides unified error handling using thiserror. A cache miss is never an
//! error; only genuine I/O, codec and configuration failures end up here.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for all cache backends.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem operation failed
    #[error("I/O error during {op} on {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Value could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// JSON codec failure
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration value could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Wraps an I/O error with the operation and path it came from.
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        CacheError::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
