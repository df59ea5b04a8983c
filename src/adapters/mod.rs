pub mod lock;

pub use lock::{FileLock, LockGuard, LockRegistry, ResourceLocker};
