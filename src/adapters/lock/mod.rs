//! Per-resource exclusive locks.
//!
//! A locker serializes save/delete operations on one file identity. Leaves
//! acquire in `on_pre_run` and hold the guard until `on_complete`, so two
//! operations on the same identity never overlap. Guards are released on drop.

pub mod file;
pub mod registry;

use crate::types::errors::Result;

pub use file::FileLock;
pub use registry::LockRegistry;

/// Held proof of exclusive access to one resource identity. Dropping it
/// releases the lock.
pub trait LockGuard: Send {}

/// Source of exclusive per-resource locks.
pub trait ResourceLocker: Send + Sync {
    /// Acquire the exclusive lock, waiting up to `timeout_ms`.
    ///
    /// # Errors
    ///
    /// Returns a `Locking` error if the lock cannot be acquired within the
    /// timeout, or an `Io` error if the locking backend fails.
    fn acquire(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>>;
}
