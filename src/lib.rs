//! kv_cache - A key-value cache with interchangeable backends
//!
//! Provides an in-process map and a directory-of-files store behind one
//! async [`Cache`] contract, both with optional TTL expiration and LRU
//! capacity eviction.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, FsCache, MemoryCache, Sweep, SweepReport};
pub use codec::{BytesCodec, Codec, JsonCodec, StringCodec};
pub use config::CacheOptions;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
