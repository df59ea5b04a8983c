//! Atomic create-or-overwrite of one file.
//!
//! New content is fully staged at the temp path while the main file stays
//! untouched; commit is the only place the visible content changes, via two
//! renames (`main -> backup`, then `temp -> main`). Rollback reads nothing but
//! the existence of the three paths, so the same analysis recovers a triple
//! left behind by a crashed process.

use crate::adapters::lock::{LockGuard, ResourceLocker};
use crate::constants::DEFAULT_LOCK_TIMEOUT_MS;
use crate::fs::{exists_no_follow, remove_if_present, rename_file};
use crate::serialize::Serializer;
use crate::txn::TransactionRunnable;
use crate::types::errors::{Error, ErrorKind, Result};
use crate::types::triple::FileTriple;

pub struct FileSave {
    triple: FileTriple,
    locker: Box<dyn ResourceLocker>,
    serializer: Box<dyn Serializer>,
    lock_timeout_ms: u64,
    guard: Option<Box<dyn LockGuard>>,
    staged: bool,
}

impl FileSave {
    #[must_use]
    pub fn new(
        triple: FileTriple,
        locker: Box<dyn ResourceLocker>,
        serializer: Box<dyn Serializer>,
    ) -> Self {
        Self {
            triple,
            locker,
            serializer,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            guard: None,
            staged: false,
        }
    }

    #[must_use]
    pub fn with_lock_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }
}

fn remove_scratch(path: &std::path::Path, what: &str) -> Result<()> {
    remove_if_present(path).map_err(|e| {
        Error::new(
            ErrorKind::Cleanup,
            format!("cannot remove {what} file {}: {e}", path.display()),
        )
    })?;
    Ok(())
}

impl TransactionRunnable for FileSave {
    fn label(&self) -> String {
        self.triple.main().display().to_string()
    }

    fn on_pre_run(&mut self) -> Result<()> {
        self.guard = Some(self.locker.acquire(self.lock_timeout_ms)?);
        // Leftovers from a previous crashed run. Failing to clear them means the
        // invariant cannot be re-established automatically.
        remove_scratch(self.triple.temp(), "temp")?;
        remove_scratch(self.triple.backup(), "backup")?;
        Ok(())
    }

    fn on_run(&mut self) -> Result<()> {
        for path in [self.triple.main(), self.triple.temp()] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                crate::fs::ensure_dir(parent)
                    .map_err(|e| Error::io("create parent directory", e))?;
            }
        }
        // Rollback infers commit progress from the temp file's existence, so the
        // temp file must exist before serialization gets a chance to fail.
        std::fs::File::create(self.triple.temp())
            .map_err(|e| Error::io("create staging file", e))?;
        let res = self.serializer.serialize(self.triple.temp());
        // Staging counts as started even when serialization failed partway;
        // rollback keys off this flag.
        self.staged = true;
        res
    }

    fn on_commit(&mut self) -> Result<()> {
        if exists_no_follow(self.triple.main()) {
            rename_file(self.triple.main(), self.triple.backup())
                .map_err(|e| Error::io("demote main to backup", e))?;
        }
        rename_file(self.triple.temp(), self.triple.main())
            .map_err(|e| Error::io("promote temp to main", e))
    }

    fn on_rollback(&mut self) -> Result<()> {
        if !self.staged {
            return Ok(());
        }
        let (main, temp, backup) = (self.triple.main(), self.triple.temp(), self.triple.backup());
        let main_e = exists_no_follow(main);
        let backup_e = exists_no_follow(backup);

        if exists_no_follow(temp) {
            // Commit was not attempted, or stopped before consuming the temp file.
            return match (backup_e, main_e) {
                (true, true) => Err(Error::new(
                    ErrorKind::CorruptedState,
                    format!(
                        "main, temp and backup all present for {}",
                        main.display()
                    ),
                )),
                // First commit rename happened, second did not.
                (true, false) => rename_file(backup, main)
                    .map_err(|e| Error::io("restore backup to main", e)),
                (false, _) => Ok(()),
            };
        }

        // Temp was consumed: commit ran at least past the promotion.
        match (backup_e, main_e) {
            (false, false) => Ok(()),
            // No prior content existed; re-stage the promoted bytes so a retry
            // remains possible, leaving main absent as it originally was.
            (false, true) => {
                rename_file(main, temp).map_err(|e| Error::io("re-stage main to temp", e))
            }
            (true, false) => {
                rename_file(backup, main).map_err(|e| Error::io("restore backup to main", e))
            }
            // Full undo of a completed commit.
            (true, true) => {
                rename_file(main, temp).map_err(|e| Error::io("re-stage main to temp", e))?;
                rename_file(backup, main).map_err(|e| Error::io("restore backup to main", e))
            }
        }
    }

    fn on_complete(&mut self) -> Result<()> {
        // Without the lock this runnable never touched the triple; the scratch
        // files, if any, belong to whoever holds it.
        if self.guard.is_none() {
            return Ok(());
        }
        let mut first_err = None;
        for (path, what) in [(self.triple.temp(), "temp"), (self.triple.backup(), "backup")] {
            if let Err(e) = remove_scratch(path, what) {
                first_err.get_or_insert(e);
            }
        }
        // The lock is released whatever happened to cleanup.
        self.guard = None;
        first_err.map_or(Ok(()), Err)
    }
}
