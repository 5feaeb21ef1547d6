//! Document locking and atomic writes for readyq
//!
//! Writers coordinate through a sentinel marker next to the document
//! (`<document>.lock`):
//! - Acquisition creates the marker with create-exclusive semantics
//! - Contention retries on a short fixed interval until the timeout
//! - A marker older than twice the timeout is treated as left behind by a
//!   crashed process, removed, and acquisition is retried once
//! - Release removes the marker and tolerates it already being gone
//!
//! Documents are replaced by writing a temp file in the same directory and
//! renaming it into place, so readers never observe a half-written file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Default retry interval when waiting for a lock
pub const LOCK_RETRY_INTERVAL_MS: u64 = 50;

/// An exclusive hold on a sentinel marker, released when dropped
#[derive(Debug)]
pub struct DocumentLock {
    path: PathBuf,
    released: bool,
}

impl DocumentLock {
    /// Acquire the marker at `path`, waiting up to `timeout_ms`
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        Self::acquire_with_retry(path, timeout_ms, LOCK_RETRY_INTERVAL_MS)
    }

    /// Acquire the marker with an explicit retry interval
    pub fn acquire_with_retry(
        path: impl AsRef<Path>,
        timeout_ms: u64,
        retry_ms: u64,
    ) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);
        let retry_interval = Duration::from_millis(retry_ms);

        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                tracing::debug!(lock = %path.display(), waited_ms = start.elapsed().as_millis() as u64, "lock acquired");
                return Ok(lock);
            }

            if start.elapsed() >= timeout {
                if marker_is_stale(path, timeout) {
                    tracing::warn!(lock = %path.display(), "removing stale lock marker");
                    remove_marker(path)?;
                    if let Some(lock) = Self::try_acquire(path)? {
                        return Ok(lock);
                    }
                }
                return Err(Error::LockTimeout {
                    path: path.to_path_buf(),
                    timeout_ms,
                });
            }

            std::thread::sleep(retry_interval);
        }
    }

    /// Try to create the marker without waiting
    ///
    /// Returns `Ok(Some(lock))` if created, `Ok(None)` if it already exists,
    /// or `Err` for other errors.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let lock = DocumentLock {
                    path: path.to_path_buf(),
                    released: false,
                };
                writeln!(file, "{}", std::process::id())?;
                Ok(Some(lock))
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Get the path to the marker
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock now instead of at drop
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        // A missing marker means someone already cleaned up after us.
        let _ = fs::remove_file(&self.path);
        tracing::debug!(lock = %self.path.display(), "lock released");
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        self.remove();
    }
}

fn marker_is_stale(path: &Path, timeout: Duration) -> bool {
    let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    age > timeout * 2
}

fn remove_marker(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Atomically replace `path` with `data`
///
/// Writes to a uniquely named temp file in the same directory, then renames
/// it over the target. The file is either fully written or not modified.
///
/// Note: This does NOT acquire a lock.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent.to_path_buf()
        }
        None => PathBuf::from("."),
    };

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Atomically write string data to a file
pub fn write_atomic_str(path: impl AsRef<Path>, data: &str) -> Result<()> {
    write_atomic(path, data.as_bytes())
}
