//! Directory tree primitives
//!
//! Merging never deletes: files present in the destination but absent from
//! the source survive untouched, files present in both are overwritten.

use crate::error::{SpecifyError, SpecifyResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

/// Counters reported by a tree copy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub dirs: usize,
    pub files: usize,
}

impl CopyStats {
    /// Fold another copy's counters into this one
    pub fn add(&mut self, other: CopyStats) {
        self.dirs += other.dirs;
        self.files += other.files;
    }
}

/// Recursively merge `src` into `dest`, preserving permission bits
pub fn merge_directories(src: &Path, dest: &Path) -> SpecifyResult<CopyStats> {
    copy_tree_with(src, dest, copy_file)
}

/// Walk `src` and mirror its directories under `dest`, handing every file
/// to `copy` with its source and destination paths.
///
/// The first failing file aborts the walk. Files already written stay.
pub fn copy_tree_with<F>(src: &Path, dest: &Path, mut copy: F) -> SpecifyResult<CopyStats>
where
    F: FnMut(&Path, &Path) -> SpecifyResult<()>,
{
    if !src.is_dir() {
        return Err(SpecifyError::PathNotFound(src.to_path_buf()));
    }

    let mut stats = CopyStats::default();
    ensure_dir(dest)?;

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            SpecifyError::io(format!("walking {}", src.display()), e.into())
        })?;
        let rel = entry.path().strip_prefix(src).map_err(|_| {
            SpecifyError::Internal(format!(
                "{} is not under {}",
                entry.path().display(),
                src.display()
            ))
        })?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
            stats.dirs += 1;
        } else {
            copy(entry.path(), &target)?;
            stats.files += 1;
        }
    }

    debug!(
        "Copied {} files, {} dirs from {} to {}",
        stats.files,
        stats.dirs,
        src.display(),
        dest.display()
    );
    Ok(stats)
}

/// Copy one file, creating parent directories. Overwrites the destination.
pub fn copy_file(src: &Path, dest: &Path) -> SpecifyResult<()> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dest).map_err(|e| {
        SpecifyError::io(
            format!("copying {} to {}", src.display(), dest.display()),
            e,
        )
    })?;
    Ok(())
}

/// Create a directory and all parents, idempotent
pub fn ensure_dir(path: &Path) -> SpecifyResult<()> {
    fs::create_dir_all(path)
        .map_err(|e| SpecifyError::io(format!("creating directory {}", path.display()), e))
}

/// Write `data` to `path` through a tempfile in the same directory, then rename
pub fn atomic_write(path: &Path, data: &[u8]) -> SpecifyResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;

    let context = || format!("writing {}", path.display());
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SpecifyError::io(context(), e))?;
    tmp.write_all(data)
        .map_err(|e| SpecifyError::io(context(), e))?;

    // Tempfiles are created 0600; keep the mode of the file being replaced
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::metadata(path)
            .map(|m| m.permissions())
            .unwrap_or_else(|_| fs::Permissions::from_mode(0o644));
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| SpecifyError::io(context(), e))?;
    }

    tmp.persist(path)
        .map_err(|e| SpecifyError::io(context(), e.error))?;
    Ok(())
}

/// True if `path` is a directory with no entries (or does not exist)
pub fn is_dir_empty(path: &Path) -> SpecifyResult<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let mut entries = fs::read_dir(path)
        .map_err(|e| SpecifyError::io(format!("reading directory {}", path.display()), e))?;
    Ok(entries.next().is_none())
}

/// Apply unix mode bits to a path; no-op elsewhere
pub fn set_mode(path: &Path, mode: u32) -> SpecifyResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)).map_err(|e| {
            SpecifyError::io(format!("setting permissions on {}", path.display()), e)
        })?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}
