//! The on-disk identity of one logical file.

use std::path::{Path, PathBuf};

use crate::constants::{BAK_SUFFIX, TMP_SUFFIX};
use crate::types::errors::{Error, ErrorKind, Result};

/// Immutable `(main, temp, backup)` path triple naming one logical file.
///
/// All three paths must live on the same filesystem so that rename is atomic;
/// that is a deployment constraint this type cannot verify portably. The triple
/// only guarantees the paths are distinct and have parent directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTriple {
    main: PathBuf,
    temp: PathBuf,
    backup: PathBuf,
}

impl FileTriple {
    /// Build a triple from explicit paths.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if any two paths are equal or a path has no parent
    /// component to rename within.
    pub fn new(
        main: impl Into<PathBuf>,
        temp: impl Into<PathBuf>,
        backup: impl Into<PathBuf>,
    ) -> Result<Self> {
        let (main, temp, backup) = (main.into(), temp.into(), backup.into());
        if main == temp || main == backup || temp == backup {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                format!(
                    "main/temp/backup must be distinct: {} / {} / {}",
                    main.display(),
                    temp.display(),
                    backup.display()
                ),
            ));
        }
        for p in [&main, &temp, &backup] {
            if p.file_name().is_none() {
                return Err(Error::new(
                    ErrorKind::InvalidPath,
                    format!("path has no file name: {}", p.display()),
                ));
            }
        }
        Ok(Self { main, temp, backup })
    }

    /// Derive temp and backup beside the main path using the crate suffixes,
    /// e.g. `a.bin` -> `a.bin.tmp` / `a.bin.bak`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if `main` has no file name.
    pub fn with_default_scratch(main: impl Into<PathBuf>) -> Result<Self> {
        let main = main.into();
        let temp = sibling_with_suffix(&main, TMP_SUFFIX)?;
        let backup = sibling_with_suffix(&main, BAK_SUFFIX)?;
        Self::new(main, temp, backup)
    }

    #[must_use]
    pub fn main(&self) -> &Path {
        &self.main
    }

    #[must_use]
    pub fn temp(&self) -> &Path {
        &self.temp
    }

    #[must_use]
    pub fn backup(&self) -> &Path {
        &self.backup
    }
}

fn sibling_with_suffix(main: &Path, suffix: &str) -> Result<PathBuf> {
    let name = main.file_name().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidPath,
            format!("path has no file name: {}", main.display()),
        )
    })?;
    let mut out = name.to_os_string();
    out.push(suffix);
    Ok(main.with_file_name(out))
}
