//! Error types used across Filetxn.
use thiserror::Error;

/// High-level error categories for transaction hooks and adapters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A path triple that cannot name a valid identity (duplicate or rootless paths).
    #[error("invalid path")]
    InvalidPath,
    /// A recoverable I/O failure (staging, rename, parent creation). Triggers rollback.
    #[error("io error")]
    Io,
    /// The exclusive lock could not be acquired within the bounded wait.
    #[error("locking")]
    Locking,
    /// A leftover temp/backup file could not be removed. Non-recoverable: the on-disk
    /// invariant was already violated by something outside this protocol.
    #[error("cleanup failed")]
    Cleanup,
    /// The three files coexist in a combination the state machine does not expect.
    /// Non-recoverable; kept distinct from `Io` so callers can route it to an operator.
    #[error("corrupted state")]
    CorruptedState,
}

/// Structured error with a kind and human message.
#[derive(Debug, Error)]
#[error("{kind}: {msg}")]
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
        }
    }

    /// Wrap a raw I/O error as a recoverable `Io` error with context.
    pub fn io(context: &str, e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, format!("{context}: {e}"))
    }

    /// True for the kinds that must propagate out of `execute()` as `Err` rather
    /// than being folded into a rolled-back outcome.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Cleanup | ErrorKind::CorruptedState)
    }

    /// Group a primary cause with secondary errors gathered while unwinding
    /// (rollback and completion do not stop at the first failure).
    #[must_use]
    pub fn aggregate(context: &str, primary: Self, secondary: &[Self]) -> Self {
        if secondary.is_empty() {
            return Self::new(primary.kind, format!("{context}: {primary}"));
        }
        let mut kind = primary.kind;
        for e in secondary {
            if e.is_fatal() {
                kind = e.kind;
            }
        }
        let tail = secondary
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self::new(kind, format!("{context}: {primary} (also: {tail})"))
    }
}

/// Convenient alias for results returning a `types::Error`.
pub type Result<T> = std::result::Result<T, Error>;
