//! Shared crate-wide constants for Filetxn.
//!
//! Centralizes magic values and default labels used across modules.

/// Suffix appended to a main path to derive the default staging (temp) path.
/// Example: `a.bin` stages at `a.bin.tmp`.
pub const TMP_SUFFIX: &str = ".tmp";

/// Suffix appended to a main path to derive the default backup path.
/// Example: the prior content of `a.bin` is demoted to `a.bin.bak` during commit.
pub const BAK_SUFFIX: &str = ".bak";

/// Suffix appended to a main path to derive the advisory lock file used by the
/// `fs2`-backed cross-process locker (see `adapters/lock/file.rs`).
pub const LOCK_SUFFIX: &str = ".lock";

/// Poll interval in milliseconds for lockers that wait with a bounded timeout.
pub const LOCK_POLL_MS: u64 = 25;

/// Default lock timeout used by leaf constructors unless overridden by
/// `with_lock_timeout_ms()`.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
