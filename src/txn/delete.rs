//! Atomic removal of one file, recoverable until finalized.
//!
//! Deletion is a rename of the main file to the backup path; only `on_complete`
//! actually destroys bytes. No temp path is involved.

use std::path::PathBuf;

use crate::adapters::lock::{LockGuard, ResourceLocker};
use crate::constants::DEFAULT_LOCK_TIMEOUT_MS;
use crate::fs::{exists_no_follow, remove_if_present, rename_file};
use crate::txn::TransactionRunnable;
use crate::types::errors::{Error, ErrorKind, Result};

pub struct FileDelete {
    main: PathBuf,
    backup: PathBuf,
    locker: Box<dyn ResourceLocker>,
    lock_timeout_ms: u64,
    guard: Option<Box<dyn LockGuard>>,
    pre_run_done: bool,
}

impl FileDelete {
    /// # Errors
    ///
    /// Returns `InvalidPath` if `main` and `backup` are the same path.
    pub fn new(
        main: impl Into<PathBuf>,
        backup: impl Into<PathBuf>,
        locker: Box<dyn ResourceLocker>,
    ) -> Result<Self> {
        let (main, backup) = (main.into(), backup.into());
        if main == backup {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                format!("main and backup must be distinct: {}", main.display()),
            ));
        }
        Ok(Self {
            main,
            backup,
            locker,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            guard: None,
            pre_run_done: false,
        })
    }

    #[must_use]
    pub fn with_lock_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }
}

impl TransactionRunnable for FileDelete {
    fn label(&self) -> String {
        self.main.display().to_string()
    }

    fn on_pre_run(&mut self) -> Result<()> {
        self.guard = Some(self.locker.acquire(self.lock_timeout_ms)?);
        remove_if_present(&self.backup).map_err(|e| {
            Error::new(
                ErrorKind::Cleanup,
                format!("cannot remove backup file {}: {e}", self.backup.display()),
            )
        })?;
        self.pre_run_done = true;
        Ok(())
    }

    fn on_run(&mut self) -> Result<()> {
        // The reversible deletion: move the file out of the way.
        if exists_no_follow(&self.main) {
            rename_file(&self.main, &self.backup)
                .map_err(|e| Error::io("demote main to backup", e))?;
        }
        Ok(())
    }

    fn on_rollback(&mut self) -> Result<()> {
        if !self.pre_run_done {
            return Ok(());
        }
        match (
            exists_no_follow(&self.backup),
            exists_no_follow(&self.main),
        ) {
            (true, false) => rename_file(&self.backup, &self.main)
                .map_err(|e| Error::io("restore backup to main", e)),
            // The rename in on_run is the only write, so both present means
            // something outside this protocol interfered.
            (true, true) => Err(Error::new(
                ErrorKind::CorruptedState,
                format!("main and backup both present for {}", self.main.display()),
            )),
            (false, _) => Ok(()),
        }
    }

    fn on_complete(&mut self) -> Result<()> {
        // Without the lock this runnable never touched the pair; a backup, if
        // any, belongs to whoever holds it.
        if self.guard.is_none() {
            return Ok(());
        }
        let res = remove_if_present(&self.backup).map_err(|e| {
            Error::new(
                ErrorKind::Cleanup,
                format!("cannot remove backup file {}: {e}", self.backup.display()),
            )
        });
        self.guard = None;
        res.map(|_| ())
    }
}
