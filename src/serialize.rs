//! Byte sources for staging: where new file content comes from.
//!
//! The save leaf only knows a [`Serializer`]; a [`StreamProvider`]-backed
//! serializer copies from whatever supplies the bytes (an in-memory buffer,
//! another file, a network body behind a caller-provided adapter).

use std::fs::OpenOptions;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::types::errors::{Error, Result};

/// Supplies the bytes to persist. Each call yields a fresh reader, consumed
/// exactly once per attempt; a rolled-back save that is retried calls again.
pub trait StreamProvider: Send {
    /// # Errors
    ///
    /// Returns an `Io` error if the source cannot be opened.
    fn stream(&self) -> Result<Box<dyn Read + Send + '_>>;
}

/// Fully and deterministically writes the intended content to `dest`, replacing
/// anything already there.
pub trait Serializer: Send {
    /// # Errors
    ///
    /// Returns an `Io` error if the content cannot be written completely.
    fn serialize(&self, dest: &Path) -> Result<()>;
}

/// Serializer that copies a [`StreamProvider`]'s bytes to the destination and
/// syncs the file before returning.
#[derive(Debug)]
pub struct StreamSerializer<P: StreamProvider> {
    provider: P,
}

impl<P: StreamProvider> StreamSerializer<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: StreamProvider> Serializer for StreamSerializer<P> {
    fn serialize(&self, dest: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(dest)
            .map_err(|e| Error::io("open staging file", e))?;
        let mut reader = self.provider.stream()?;
        std::io::copy(&mut reader, &mut file).map_err(|e| Error::io("write staging file", e))?;
        file.sync_all().map_err(|e| Error::io("sync staging file", e))?;
        Ok(())
    }
}

/// In-memory byte source. A string payload is this with its UTF-8 bytes.
#[derive(Debug, Clone)]
pub struct MemoryStreamProvider {
    bytes: Vec<u8>,
}

impl MemoryStreamProvider {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&str> for MemoryStreamProvider {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl StreamProvider for MemoryStreamProvider {
    fn stream(&self) -> Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(Cursor::new(self.bytes.as_slice())))
    }
}

/// Byte source that reads another file, e.g. previously stored content.
#[derive(Debug, Clone)]
pub struct FileStreamProvider {
    path: PathBuf,
}

impl FileStreamProvider {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StreamProvider for FileStreamProvider {
    fn stream(&self) -> Result<Box<dyn Read + Send + '_>> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| Error::io("open stream source", e))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn stream_serializer_replaces_prior_content() {
        let td = tempfile::tempdir().unwrap();
        let dest = td.path().join("out");
        fs::write(&dest, b"a much longer prior payload").unwrap();
        let s = StreamSerializer::new(MemoryStreamProvider::new(vec![1, 2, 3]));
        s.serialize(&dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn memory_provider_can_be_consumed_per_attempt() {
        let p = MemoryStreamProvider::from("abc");
        for _ in 0..2 {
            let mut buf = Vec::new();
            p.stream().unwrap().read_to_end(&mut buf).unwrap();
            assert_eq!(buf, b"abc");
        }
    }

    #[test]
    fn file_provider_copies_between_files() {
        let td = tempfile::tempdir().unwrap();
        let src = td.path().join("src");
        let dest = td.path().join("dest");
        fs::write(&src, b"payload").unwrap();
        let s = StreamSerializer::new(FileStreamProvider::new(src));
        s.serialize(&dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn missing_source_surfaces_io_error() {
        let td = tempfile::tempdir().unwrap();
        let s = StreamSerializer::new(FileStreamProvider::new(td.path().join("nope")));
        let err = s.serialize(&td.path().join("dest")).unwrap_err();
        assert_eq!(err.kind, crate::types::errors::ErrorKind::Io);
    }
}
