//! Filesystem operations module.
//!
//! This module provides low-level operations for:
//! - Discovering regular files under a set of source roots
//! - Creating directories recursively
//! - Copying files with metadata preservation
//! - Moving files without ever deleting a source before its copy is confirmed

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use walkdir::WalkDir;

use crate::checksums::{self, ChecksumAlgorithm};
use crate::error::EngineError;

/// Result of scanning the source roots.
///
/// `problems` holds non-fatal conditions (missing roots, unreadable entries)
/// in the order they were met.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub problems: Vec<EngineError>,
}

/// How a move was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMethod {
    /// Single atomic rename on the same filesystem
    Renamed,
    /// Copied, confirmed, then the source removed
    CopiedThenRemoved,
}

/// Recursively collect every regular file under each of `roots`.
///
/// Directories are descended into and never yielded. Symlinks are not
/// followed. A root that does not exist is recorded as
/// [`EngineError::SourceNotFound`] and the remaining roots are still scanned.
pub fn discover_files<P: AsRef<Path>>(roots: &[P]) -> Discovery {
    let mut discovery = Discovery::default();

    for root in roots {
        let root = root.as_ref();
        if fs::symlink_metadata(root).is_err() {
            tracing::warn!(root = %root.display(), "source folder missing, skipping");
            discovery.problems.push(EngineError::SourceNotFound {
                path: root.to_path_buf(),
            });
            continue;
        }

        for entry in WalkDir::new(root).follow_links(false) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    discovery.files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
                    discovery
                        .problems
                        .push(EngineError::EnumerationFailed { path, source });
                }
            }
        }
    }

    discovery
}

/// Ensure `dir` and all of its missing ancestors exist.
///
/// Calling this on an existing directory is a no-op. Fails if the path
/// cannot be created or is occupied by something that is not a directory.
pub fn ensure_dir(dir: &Path) -> Result<(), EngineError> {
    match fs::metadata(dir) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "path exists but is not a directory",
            ),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| EngineError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(EngineError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Copy a file from `src` to a new file at `dst`, preserving timestamps.
///
/// `dst` must not exist yet; an existing entry is never overwritten. The
/// written data is flushed to disk and its length checked against the
/// source. With `verify` set, checksums of both files are compared too. On
/// any failure after `dst` was created the partial file is removed.
///
/// Returns the number of bytes copied.
pub fn copy_file_with_metadata(
    src: &Path,
    dst: &Path,
    verify: Option<ChecksumAlgorithm>,
) -> Result<u64, EngineError> {
    copy_with(src, dst, verify, |reader, writer| io::copy(reader, writer))
}

fn copy_with(
    src: &Path,
    dst: &Path,
    verify: Option<ChecksumAlgorithm>,
    fill: impl FnOnce(&mut fs::File, &mut fs::File) -> io::Result<u64>,
) -> Result<u64, EngineError> {
    let mut src_file = fs::File::open(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;
    let src_metadata = src_file.metadata().map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    let mut dst_file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(|e| EngineError::WriteError {
            path: dst.to_path_buf(),
            source: e,
        })?;

    let written = fill(&mut src_file, &mut dst_file)
        .and_then(|n| dst_file.sync_all().map(|_| n))
        .map_err(|e| EngineError::WriteError {
            path: dst.to_path_buf(),
            source: e,
        });
    drop(dst_file);

    let result = written.and_then(|bytes| {
        confirm_written(src, dst, src_metadata.len(), verify)?;
        Ok(bytes)
    });

    match result {
        Ok(bytes) => {
            let atime = FileTime::from_last_access_time(&src_metadata);
            let mtime = FileTime::from_last_modification_time(&src_metadata);
            if let Err(e) = filetime::set_file_times(dst, atime, mtime) {
                tracing::debug!(path = %dst.display(), error = %e, "could not preserve timestamps");
            }
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(dst);
            Err(e)
        }
    }
}

/// Move `src` to `dst`.
///
/// A rename is tried first. If it fails (for example across filesystem
/// boundaries) the file is copied with [`copy_file_with_metadata`] and the
/// source removed only once that copy has been confirmed. A failure at any
/// point before removal leaves the source untouched.
pub fn move_file(
    src: &Path,
    dst: &Path,
    verify: Option<ChecksumAlgorithm>,
) -> Result<MoveMethod, EngineError> {
    move_with(
        src,
        dst,
        |from, to| fs::rename(from, to),
        |from, to| copy_file_with_metadata(from, to, verify),
        |path| fs::remove_file(path),
    )
}

// Each step is injected so tests can force the fallback and its failure modes.
fn move_with(
    src: &Path,
    dst: &Path,
    rename: impl FnOnce(&Path, &Path) -> io::Result<()>,
    copy: impl FnOnce(&Path, &Path) -> Result<u64, EngineError>,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<MoveMethod, EngineError> {
    match rename(src, dst) {
        Ok(()) => return Ok(MoveMethod::Renamed),
        Err(e) => {
            tracing::debug!(
                src = %src.display(),
                error = %e,
                "rename failed, falling back to copy then remove"
            );
        }
    }

    copy(src, dst)?;
    remove(src).map_err(|e| EngineError::RemoveFailed {
        path: src.to_path_buf(),
        source: e,
    })?;
    Ok(MoveMethod::CopiedThenRemoved)
}

fn confirm_written(
    src: &Path,
    dst: &Path,
    expected: u64,
    verify: Option<ChecksumAlgorithm>,
) -> Result<(), EngineError> {
    let actual = fs::metadata(dst)
        .map_err(|e| EngineError::WriteError {
            path: dst.to_path_buf(),
            source: e,
        })?
        .len();
    if actual != expected {
        return Err(EngineError::SizeMismatch {
            path: dst.to_path_buf(),
            expected,
            actual,
        });
    }

    if let Some(algorithm) = verify {
        if !checksums::files_match(src, dst, algorithm)? {
            return Err(EngineError::ChecksumMismatch {
                path: dst.to_path_buf(),
                algorithm,
            });
        }
    }
    Ok(())
}
