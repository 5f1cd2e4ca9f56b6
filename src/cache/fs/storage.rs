//! Filesystem primitives used by the directory-backed cache.
//!
//! Everything the cache needs from the filesystem goes through
//! [`FileSystem`]. [`LocalFs`] is the real implementation on top of
//! `tokio::fs`; timestamp updates use `filetime` on the blocking pool.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use filetime::FileTime;
use tracing::debug;

/// Modification and access time of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub modified: SystemTime,
    pub accessed: SystemTime,
}

// == File System ==
/// Async filesystem operations the cache relies on.
///
/// Errors keep their `io::ErrorKind` so callers can tell a vanished file
/// (`NotFound`) from a real failure.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Creates a directory and its parents. An existing directory is fine.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Recursively removes a directory.
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Names of the entries directly inside a directory.
    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Creates or truncates a file with the given contents.
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    async fn times(&self, path: &Path) -> io::Result<FileTimes>;

    /// Sets both the access and modification time.
    async fn set_times(&self, path: &Path, at: SystemTime) -> io::Result<()>;

    /// Sets the access time, leaving the modification time alone.
    async fn set_accessed(&self, path: &Path, at: SystemTime) -> io::Result<()>;
}

// == Local FS ==
/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

/// Runs a blocking `filetime` call off the async workers.
async fn blocking<F>(path: &Path, f: F) -> io::Result<()>
where
    F: FnOnce(PathBuf) -> io::Result<()> + Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || f(path))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

#[async_trait]
impl FileSystem for LocalFs {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!(name = ?raw, "Skipping non UTF-8 file name"),
            }
        }
        Ok(names)
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn times(&self, path: &Path) -> io::Result<FileTimes> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(FileTimes {
            modified: metadata.modified()?,
            accessed: metadata.accessed()?,
        })
    }

    async fn set_times(&self, path: &Path, at: SystemTime) -> io::Result<()> {
        let time = FileTime::from_system_time(at);
        blocking(path, move |path| filetime::set_file_times(path, time, time)).await
    }

    async fn set_accessed(&self, path: &Path, at: SystemTime) -> io::Result<()> {
        let time = FileTime::from_system_time(at);
        blocking(path, move |path| filetime::set_file_atime(path, time)).await
    }
}

/// Shares one filesystem between several caches.
#[async_trait]
impl<T: FileSystem + ?Sized> FileSystem for Arc<T> {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir_all(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir_all(path).await
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        (**self).list_dir(path).await
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        (**self).write(path, contents).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path).await
    }

    async fn times(&self, path: &Path) -> io::Result<FileTimes> {
        (**self).times(path).await
    }

    async fn set_times(&self, path: &Path, at: SystemTime) -> io::Result<()> {
        (**self).set_times(path, at).await
    }

    async fn set_accessed(&self, path: &Path, at: SystemTime) -> io::Result<()> {
        (**self).set_accessed(path, at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_list_dir_returns_file_names() {
        let dir = tempfile::tempdir().unwrap();
        LocalFs.write(&dir.path().join("a"), b"1").await.unwrap();
        LocalFs.write(&dir.path().join("b"), b"2").await.unwrap();

        let mut names = LocalFs.list_dir(dir.path()).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_paths_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let err = LocalFs.times(&missing).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        let err = LocalFs.list_dir(&missing).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        let err = LocalFs.remove_file(&missing).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_set_times_and_accessed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry");
        LocalFs.write(&path, b"x").await.unwrap();

        let written = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        LocalFs.set_times(&path, written).await.unwrap();
        let times = LocalFs.times(&path).await.unwrap();
        assert_eq!(times.modified, written);
        assert_eq!(times.accessed, written);

        let read = written + Duration::from_secs(60);
        LocalFs.set_accessed(&path, read).await.unwrap();
        let times = LocalFs.times(&path).await.unwrap();
        assert_eq!(times.modified, written);
        assert_eq!(times.accessed, read);
    }
}
