//! Advisory file lock for deployments where several processes share one
//! filesystem. Uses `fs2` exclusive locks with a bounded poll loop.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::constants::{LOCK_POLL_MS, LOCK_SUFFIX};
use crate::types::errors::{Error, ErrorKind, Result};

use super::{LockGuard, ResourceLocker};

/// Cross-process exclusive lock backed by an advisory lock file.
#[derive(Debug, Clone)]
pub struct FileLock {
    path: PathBuf,
}

impl FileLock {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Lock file derived from the main path, e.g. `a.bin` -> `a.bin.lock`.
    #[must_use]
    pub fn beside(main: &Path) -> Self {
        let mut name = main.as_os_str().to_os_string();
        name.push(LOCK_SUFFIX);
        Self { path: name.into() }
    }
}

struct FileGuard {
    file: File,
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl LockGuard for FileGuard {}

impl ResourceLocker for FileLock {
    fn acquire(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>> {
        let t0 = Instant::now();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| Error::io("open lock file", e))?;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Box::new(FileGuard { file })),
                Err(_e) => {
                    if t0.elapsed() >= Duration::from_millis(timeout_ms) {
                        return Err(Error::new(
                            ErrorKind::Locking,
                            format!("timeout acquiring file lock {}", self.path.display()),
                        ));
                    }
                    thread::sleep(Duration::from_millis(LOCK_POLL_MS));
                }
            }
        }
    }
}
