#![forbid(unsafe_code)]
//! Filetxn: crash-safe transactional file save and delete.
//!
//! Safety model highlights:
//! - A logical file is identified by a `(main, temp, backup)` path triple on one
//!   filesystem. New content is fully staged at `temp`, then promoted with a pair of
//!   renames (`main -> backup`, `temp -> main`). Deletion renames `main -> backup`
//!   so it stays reversible until finalized.
//! - Every operation runs through a fixed hook skeleton
//!   (`pre_run -> run -> commit | rollback -> complete`). Rollback restores the
//!   pre-operation state purely from which of the three files exist on disk, so the
//!   same case analysis recovers after an abrupt process death.
//! - Renames use `rustix` dirfd-relative syscalls with a destination existence
//!   check and directory fsync.
//! - The default per-identity lock is process-local. Deployments where several
//!   processes share one filesystem must use the `fs2`-backed
//!   [`adapters::lock::FileLock`] instead.
//! - This crate forbids `unsafe`.

pub mod adapters;
pub mod constants;
pub mod fs;
pub mod logging;
pub mod serialize;
pub mod txn;
pub mod types;

pub use serialize::{Serializer, StreamProvider};
pub use txn::{FileDelete, FileSave, Outcome, Transaction, TransactionRunnable};
pub use types::triple::FileTriple;
