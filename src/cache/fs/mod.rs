//! Directory-Backed Backend
//!
//! One file per entry, named after its key, holding the codec output verbatim.
//! Timestamps live in file metadata:
//!
//! - `set` stamps both the modification and access time of the written file
//! - a successful `get` stamps the access time
//!
//! Access times are written explicitly rather than left to the filesystem, so
//! LRU ordering still holds on `noatime`/`relatime` mounts.
//!
//! The directory may be changed by other instances or processes at any time.
//! A file that disappears between listing, stat, read or delete is treated as
//! already gone; any other I/O failure is returned to the caller.

mod storage;

use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use crate::cache::policy::{EntryMeta, EvictionPolicy};
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::sweep::{run_sweep, SweepReport, SweepTarget};
use crate::cache::{Cache, Sweep};
use crate::codec::Codec;
use crate::config::CacheOptions;
use crate::error::{CacheError, Result};

pub use storage::{FileSystem, FileTimes, LocalFs};

fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

// == Fs Cache ==
/// Cache storing each entry as a file in `dir`.
///
/// Keys are used as file names without escaping; callers must supply
/// filesystem-safe keys.
pub struct FsCache<V, C, F = LocalFs> {
    dir: PathBuf,
    policy: EvictionPolicy,
    codec: C,
    fs: F,
    /// Single-flight directory creation, replaced by `delete_all`
    init: RwLock<Arc<OnceCell<()>>>,
    stats: StatsRecorder,
    _value: PhantomData<fn() -> V>,
}

impl<V, C> FsCache<V, C, LocalFs>
where
    C: Codec<V>,
{
    /// Creates a cache over `dir` on the local filesystem.
    ///
    /// Nothing touches the disk until the first `set`.
    pub fn new(dir: impl Into<PathBuf>, options: CacheOptions, codec: C) -> Self {
        Self::with_file_system(dir, options, codec, LocalFs)
    }
}

impl<V, C, F> FsCache<V, C, F>
where
    C: Codec<V>,
    F: FileSystem,
{
    /// Creates a cache that performs all I/O through `fs`.
    pub fn with_file_system(
        dir: impl Into<PathBuf>,
        options: CacheOptions,
        codec: C,
        fs: F,
    ) -> Self {
        Self {
            dir: dir.into(),
            policy: EvictionPolicy::from_options(&options),
            codec,
            fs,
            init: RwLock::new(Arc::new(OnceCell::new())),
            stats: StatsRecorder::default(),
            _value: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Stored keys in ascending order. A missing directory has no keys.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = match self.fs.list_dir(&self.dir).await {
            Ok(names) => names,
            Err(e) if is_not_found(&e) => Vec::new(),
            Err(e) => return Err(CacheError::io("list", &self.dir, e)),
        };
        keys.sort();
        Ok(keys)
    }

    /// Number of files in the cache directory.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.keys().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    // == Directory Init ==
    /// Creates the directory once per lifecycle.
    ///
    /// Concurrent callers wait on the same attempt. A failed attempt is not
    /// remembered, so the next writer tries again.
    async fn ensure_dir(&self) -> Result<()> {
        let cell = self.init.read().await.clone();
        cell.get_or_try_init(|| self.create_dir()).await?;
        Ok(())
    }

    async fn create_dir(&self) -> Result<()> {
        self.fs
            .create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::io("create_dir", &self.dir, e))?;
        debug!(dir = %self.dir.display(), "Initialized cache directory");
        Ok(())
    }

    /// Writes `bytes` to `path`, recreating the directory once if it was
    /// removed behind this instance's back.
    async fn write_entry(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        match self.fs.write(path, bytes).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!(dir = %self.dir.display(), "Cache directory vanished, recreating");
                self.create_dir().await?;
                self.fs
                    .write(path, bytes)
                    .await
                    .map_err(|e| CacheError::io("write", path, e))
            }
            Err(e) => Err(CacheError::io("write", path, e)),
        }
    }

    /// Deletes a file, treating an already missing file as success.
    async fn remove_entry(&self, path: &Path) -> Result<()> {
        remove_file_if_exists(&self.fs, path).await
    }

    fn sweeper(&self) -> FsSweep<'_, F> {
        FsSweep {
            dir: &self.dir,
            fs: &self.fs,
        }
    }
}

async fn remove_file_if_exists<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<()> {
    match fs.remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if is_not_found(&e) => {
            debug!(path = %path.display(), "Cache file already removed");
            Ok(())
        }
        Err(e) => Err(CacheError::io("remove", path, e)),
    }
}

// == Sweep ==
/// Result of probing one listed file.
enum Probe {
    Found(EntryMeta<SystemTime>),
    /// Deleted between listing and stat
    Vanished,
}

struct FsSweep<'a, F> {
    dir: &'a Path,
    fs: &'a F,
}

impl<'a, F: FileSystem> FsSweep<'a, F> {
    async fn probe(&self, name: String) -> Result<Probe> {
        let path = self.dir.join(&name);
        match self.fs.times(&path).await {
            Ok(times) => Ok(Probe::Found(EntryMeta {
                key: name,
                modified_at: times.modified,
                accessed_at: times.accessed,
            })),
            Err(e) if is_not_found(&e) => {
                debug!(path = %path.display(), "Cache file vanished during sweep");
                Ok(Probe::Vanished)
            }
            Err(e) => Err(CacheError::io("stat", &path, e)),
        }
    }
}

#[async_trait]
impl<'a, F: FileSystem> SweepTarget for FsSweep<'a, F> {
    type Timestamp = SystemTime;

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn scan(&mut self) -> Result<Vec<EntryMeta<SystemTime>>> {
        let mut names = match self.fs.list_dir(self.dir).await {
            Ok(names) => names,
            // Never written, or removed by delete_all elsewhere
            Err(e) if is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io("list", self.dir, e)),
        };

        // Listing order is filesystem dependent; equal access times break by name
        names.sort();
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            if let Probe::Found(meta) = self.probe(name).await? {
                entries.push(meta);
            }
        }
        Ok(entries)
    }

    async fn remove(&mut self, key: &str) -> Result<()> {
        remove_file_if_exists(self.fs, &self.dir.join(key)).await
    }
}

#[async_trait]
impl<V, C, F> Cache<V> for FsCache<V, C, F>
where
    V: Send + 'static,
    C: Codec<V>,
    F: FileSystem,
{
    // == Get ==
    async fn get(&self, key: &str) -> Result<Option<V>> {
        let path = self.entry_path(key);

        let times = match self.fs.times(&path).await {
            Ok(times) => times,
            Err(e) if is_not_found(&e) => {
                self.stats.record_miss();
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io("stat", &path, e)),
        };

        if self.policy.is_stale(times.modified, SystemTime::now()) {
            self.remove_entry(&path).await?;
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!(key, "Expired cache file on read");
            return Ok(None);
        }

        let bytes = match self.fs.read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if is_not_found(&e) => {
                self.stats.record_miss();
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io("read", &path, e)),
        };
        let value = self.codec.decode(&bytes)?;

        match self.fs.set_accessed(&path, SystemTime::now()).await {
            Ok(()) => {}
            // Deleted right after the read; the value we hold is still valid
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(CacheError::io("touch", &path, e)),
        }

        self.stats.record_hit();
        Ok(Some(value))
    }

    // == Set ==
    async fn set(&self, key: &str, value: V) -> Result<()> {
        let bytes = self.codec.encode(&value)?;
        self.ensure_dir().await?;

        let path = self.entry_path(key);
        self.write_entry(&path, &bytes).await?;
        match self.fs.set_times(&path, SystemTime::now()).await {
            Ok(()) => {}
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(CacheError::io("touch", &path, e)),
        }

        self.sweep().await?;
        Ok(())
    }

    // == Delete ==
    async fn delete(&self, key: &str) -> Result<()> {
        self.remove_entry(&self.entry_path(key)).await
    }

    async fn delete_all(&self) -> Result<()> {
        let removed = match self.fs.remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(CacheError::io("remove_dir", &self.dir, e)),
        };
        // Reset even on failure: directory creation is idempotent.
        *self.init.write().await = Arc::new(OnceCell::new());
        removed
    }
}

#[async_trait]
impl<V, C, F> Sweep for FsCache<V, C, F>
where
    V: Send + 'static,
    C: Codec<V>,
    F: FileSystem,
{
    async fn sweep(&self) -> Result<SweepReport> {
        let report = run_sweep(&self.policy, &mut self.sweeper()).await?;
        self.stats.record_sweep(&report);
        Ok(report)
    }
}
