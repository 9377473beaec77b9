//! Hash-gated atomic writer used by every task that touches the output,
//! override or source trees.
//!
//! ## `atomic_write`
//!
//! 1. SHA-256 hash the new content.
//! 2. Hash the file currently on disk (if any) → skip if identical.
//! 3. Write to `<path>.themesmith.tmp`.
//! 4. Rename to final path (atomic on POSIX).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

const TMP_SUFFIX: &str = ".themesmith.tmp";

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; on-disk content already matches.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically write `content` to `path`, creating parent directories.
pub fn atomic_write(path: &Path, content: &[u8], dry_run: bool) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}{TMP_SUFFIX}", path.display()));
    atomic_write_with_tmp(path, content, dry_run, &tmp)
}

fn atomic_write_with_tmp(
    path: &Path,
    content: &[u8],
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    let digest = sha256_hex(content);
    if let Some(existing) = hash_existing(path)? {
        if existing == digest {
            tracing::debug!(path = %path.display(), "unchanged");
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if dry_run {
        tracing::info!(path = %path.display(), "[dry-run] would write");
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!(path = %path.display(), "wrote");
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// Copy `src` to `dst` through [`atomic_write`].
///
/// Returns `Ok(None)` when `src` does not exist.
pub fn copy_file(src: &Path, dst: &Path, dry_run: bool) -> Result<Option<WriteResult>, SyncError> {
    match std::fs::read(src) {
        Ok(bytes) => atomic_write(dst, &bytes, dry_run).map(Some),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %src.display(), "source vanished; skipping copy");
            Ok(None)
        }
        Err(err) => Err(io_err(src, err)),
    }
}

/// Delete `path`. A file that does not exist is not an error.
///
/// Returns whether a file was (or, in dry-run, would be) removed.
pub fn remove(path: &Path, dry_run: bool) -> Result<bool, SyncError> {
    if dry_run {
        let exists = path.is_file();
        if exists {
            tracing::info!(path = %path.display(), "[dry-run] would remove");
        }
        return Ok(exists);
    }
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "removed");
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(path, err)),
    }
}

fn sha256_hex(content: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(content);
    hex::encode(h.finalize())
}

fn hash_existing(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(sha256_hex(&bytes))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
