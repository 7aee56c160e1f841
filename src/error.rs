//! Error types for the point-file API.
//!
//! Каждая операция возвращает `Result<T, PtError>` вместо числового статуса.
//! `PtError::kind()` даёт плоский дискриминант для `match` в вызывающем коде.

use std::fmt;
use std::path::Path;

/// Fieldless discriminant of [`PtError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    DuplicateName,
    NotOpen,
    InvalidHandle,
    ResourceBusy,
    ReadOnly,
    InvalidName,
    Locked,
    Corrupt,
    Poisoned,
    Io,
}

/// Errors surfaced by file sessions, the handle table and the point registry.
#[derive(Debug)]
pub enum PtError {
    /// Path (or catalogued point) does not exist.
    NotFound(String),
    /// A point with this name is already live in the session.
    DuplicateName(String),
    /// The session is not open (closed concurrently or never opened).
    NotOpen,
    /// Unknown, released, detached or wrong-kind identifier.
    InvalidHandle(u64),
    /// Close attempted while points are still attached.
    ResourceBusy {
        /// Number of live points at the time of the call.
        live: usize,
    },
    /// Mutating operation on a read-only session.
    ReadOnly(String),
    /// Point name rejected by validation.
    InvalidName {
        name: String,
        reason: &'static str,
    },
    /// Another session holds a conflicting advisory lock on the file.
    Locked(String),
    /// The container file is not a valid point catalog.
    Corrupt(String),
    /// A lock was poisoned by a panicking thread.
    Poisoned(&'static str),
    /// I/O failure with a short description of what was attempted.
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl PtError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PtError::NotFound(_) => ErrorKind::NotFound,
            PtError::DuplicateName(_) => ErrorKind::DuplicateName,
            PtError::NotOpen => ErrorKind::NotOpen,
            PtError::InvalidHandle(_) => ErrorKind::InvalidHandle,
            PtError::ResourceBusy { .. } => ErrorKind::ResourceBusy,
            PtError::ReadOnly(_) => ErrorKind::ReadOnly,
            PtError::InvalidName { .. } => ErrorKind::InvalidName,
            PtError::Locked(_) => ErrorKind::Locked,
            PtError::Corrupt(_) => ErrorKind::Corrupt,
            PtError::Poisoned(_) => ErrorKind::Poisoned,
            PtError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn corrupt(path: &Path, what: impl fmt::Display) -> Self {
        PtError::Corrupt(format!("{}: {}", path.display(), what))
    }
}

impl fmt::Display for PtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PtError::NotFound(what) => write!(f, "not found: {what}"),
            PtError::DuplicateName(name) => write!(f, "point '{name}' is already live in this file"),
            PtError::NotOpen => write!(f, "file session is not open"),
            PtError::InvalidHandle(id) => write!(f, "invalid handle {id:#x}"),
            PtError::ResourceBusy { live } => {
                write!(f, "file session busy: {live} point(s) still attached")
            }
            PtError::ReadOnly(op) => write!(f, "{op}: file session is read-only"),
            PtError::InvalidName { name, reason } => {
                write!(f, "invalid point name {name:?}: {reason}")
            }
            PtError::Locked(path) => write!(f, "file is locked by another session: {path}"),
            PtError::Corrupt(msg) => write!(f, "corrupt point catalog: {msg}"),
            PtError::Poisoned(what) => write!(f, "{what} lock poisoned"),
            PtError::Io { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl std::error::Error for PtError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PtError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PtError>;

/// `with_context` для io::Result без anyhow: прикрепляет описание операции.
pub(crate) trait IoContext<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|source| PtError::Io {
            context: f(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(PtError::NotOpen.kind(), ErrorKind::NotOpen);
        assert_eq!(PtError::ResourceBusy { live: 2 }.kind(), ErrorKind::ResourceBusy);
        assert_eq!(PtError::InvalidHandle(7).kind(), ErrorKind::InvalidHandle);
    }

    #[test]
    fn io_context_keeps_source() {
        let r: std::io::Result<()> = Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let e = r.io_context(|| "write catalog".to_string()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Io);
        assert!(e.to_string().starts_with("write catalog: "));
        assert!(std::error::Error::source(&e).is_some());
    }
}
