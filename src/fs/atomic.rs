//! Rename and unlink primitives used by the transaction hooks.
//!
//! Mutations go through directory handles:
//! `open_dir_nofollow(parent) -> renameat/unlinkat on the final component -> fsync(dirfd)`.
//! Every rename is followed by an existence check of the destination through the
//! already-open handle; a rename the OS silently dropped surfaces as an error
//! instead of corrupting the commit sequence.

use std::ffi::{CString, OsStr};
use std::fs;
use std::path::Path;

use rustix::fd::OwnedFd;
use rustix::fs::{fsync, openat, renameat, statat, unlinkat, AtFlags, Mode, OFlags, CWD};
use rustix::io::Errno;

fn errno_to_io(e: Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(e.raw_os_error())
}

fn cstr(name: &OsStr) -> std::io::Result<CString> {
    use std::os::unix::ffi::OsStrExt;
    CString::new(name.as_bytes())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid path"))
}

/// Split a path into its parent directory and final component.
fn split(path: &Path) -> std::io::Result<(&Path, CString)> {
    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok((parent, cstr(name)?))
}

/// Open a directory with `O_DIRECTORY` | `O_NOFOLLOW` for atomic operations.
///
/// # Errors
///
/// Returns an IO error if the directory cannot be opened.
pub fn open_dir_nofollow(dir: &Path) -> std::io::Result<OwnedFd> {
    let c = cstr(dir.as_os_str())?;
    openat(
        CWD,
        c.as_c_str(),
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC | OFlags::NOFOLLOW,
        Mode::empty(),
    )
    .map_err(errno_to_io)
}

fn fsync_dirfd(dirfd: &OwnedFd) -> std::io::Result<()> {
    fsync(dirfd).map_err(errno_to_io)
}

/// Whether `path` names an existing entry, without following a trailing symlink.
#[must_use]
pub fn exists_no_follow(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Create `path` and all missing ancestors as directories.
///
/// # Errors
///
/// Returns an IO error if a component cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

/// Unlink `path` if it exists. Returns whether anything was removed; a missing
/// file (or missing parent directory) is not an error.
///
/// # Errors
///
/// Returns an IO error for any failure other than the entry being absent.
pub fn remove_if_present(path: &Path) -> std::io::Result<bool> {
    let (parent, name) = split(path)?;
    let dirfd = match open_dir_nofollow(parent) {
        Ok(fd) => fd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    match unlinkat(&dirfd, name.as_c_str(), AtFlags::empty()) {
        Ok(()) => {
            let _ = fsync_dirfd(&dirfd);
            Ok(true)
        }
        Err(e) if e == Errno::NOENT => Ok(false),
        Err(e) => Err(errno_to_io(e)),
    }
}

/// Atomically rename `from` to `to`, replacing `to` if present.
///
/// Both paths must live on the same filesystem. After the rename the destination
/// is stat'ed through the open directory handle; absence means the OS dropped the
/// rename and is reported as `NotFound`.
///
/// # Errors
///
/// Returns an IO error if the rename fails or cannot be verified.
pub fn rename_file(from: &Path, to: &Path) -> std::io::Result<()> {
    let (from_parent, from_name) = split(from)?;
    let (to_parent, to_name) = split(to)?;
    let from_dirfd = open_dir_nofollow(from_parent)?;
    let to_dirfd = if from_parent == to_parent {
        None
    } else {
        Some(open_dir_nofollow(to_parent)?)
    };
    let dst = to_dirfd.as_ref().unwrap_or(&from_dirfd);

    renameat(&from_dirfd, from_name.as_c_str(), dst, to_name.as_c_str()).map_err(errno_to_io)?;

    statat(dst, to_name.as_c_str(), AtFlags::SYMLINK_NOFOLLOW).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!(
                "rename reported success but destination is missing: {}",
                to.display()
            ),
        )
    })?;

    let _ = fsync_dirfd(&from_dirfd);
    if let Some(fd) = to_dirfd.as_ref() {
        let _ = fsync_dirfd(fd);
    }
    Ok(())
}
