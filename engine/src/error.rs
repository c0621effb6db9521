//! Error types for the organizer engine.
//!
//! Two families live here. `StartError` is returned synchronously from
//! `Organizer::start` and rejects a run before any work begins. `EngineError`
//! describes a failure scoped to one source root or one file; the engine turns
//! it into a log event and keeps going, so it never crosses the worker boundary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::checksums::ChecksumAlgorithm;

/// Reasons a run is refused at invocation time.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("at least one source folder is required")]
    NoSources,

    #[error("a destination folder is required")]
    NoDestination,

    #[error("an organize run is already in progress")]
    AlreadyRunning,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Failures scoped to a single source root or file.
///
/// File-level errors are recorded as log events, not propagated.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("source folder not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("failed to enumerate {}: {source}", path.display())]
    EnumerationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("copied {} but could not remove the original: {source}", path.display())]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{algorithm} mismatch after writing {}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        algorithm: ChecksumAlgorithm,
    },

    #[error("size mismatch after writing {}: expected {expected} bytes, found {actual}", path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("no free name for {name} in {}", dir.display())]
    NameExhausted { dir: PathBuf, name: String },
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::EnumerationFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::RemoveFailed { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}
