//! In-process lock registry: one exclusive lock per file identity.
//!
//! This is the default locker. It is process-local by design; it gives no
//! protection against a second process operating on the same identity (use
//! [`super::FileLock`] for that deployment shape).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use crate::constants::LOCK_POLL_MS;
use crate::types::errors::{Error, ErrorKind, Result};

use super::{LockGuard, ResourceLocker};

/// Shared registry handing out per-identity lockers keyed by main path.
///
/// Callers hold one registry per store and ask it for a [`ResourceLock`] per
/// logical file; two lockers for the same main path share the same underlying
/// mutex.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The locker for the identity rooted at `main`.
    #[must_use]
    pub fn locker_for(&self, main: &Path) -> ResourceLock {
        let mut locks = self.locks.lock();
        let inner = locks
            .entry(main.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        ResourceLock { inner }
    }
}

/// Exclusive in-process lock for one file identity.
#[derive(Debug, Clone)]
pub struct ResourceLock {
    inner: Arc<Mutex<()>>,
}

struct RegistryGuard {
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl LockGuard for RegistryGuard {}

impl ResourceLocker for ResourceLock {
    fn acquire(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>> {
        let t0 = Instant::now();
        loop {
            if let Some(guard) = self.inner.try_lock_arc() {
                return Ok(Box::new(RegistryGuard { _guard: guard }));
            }
            if t0.elapsed() >= Duration::from_millis(timeout_ms) {
                return Err(Error::new(
                    ErrorKind::Locking,
                    "timeout acquiring resource lock",
                ));
            }
            thread::sleep(Duration::from_millis(LOCK_POLL_MS));
        }
    }
}
