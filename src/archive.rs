//! ZIP extraction with traversal protection
//!
//! Entry names are validated up front: a single entry that is absolute or
//! climbs out with `..` fails the whole extraction before anything is
//! written. Release archives often wrap their payload in one top-level
//! directory; [`extract_with_flatten`] strips that wrapper.

use crate::error::{SpecifyError, SpecifyResult};
use crate::tree::{self, CopyStats};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

/// Default mode for directories whose entry declares none
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Counters for an extraction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub dirs: usize,
}

/// A validated archive entry
struct PlannedEntry {
    index: usize,
    rel: PathBuf,
    is_dir: bool,
    mode: Option<u32>,
}

/// Extract every entry of `archive` beneath `dest`
pub fn extract_zip(archive: &Path, dest: &Path) -> SpecifyResult<ExtractStats> {
    let file = File::open(archive)
        .map_err(|e| SpecifyError::io(format!("opening archive {}", archive.display()), e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| SpecifyError::extraction(archive, e))?;

    let plan = plan_entries(&mut zip, archive)?;
    debug!("Extracting {} entries from {}", plan.len(), archive.display());

    tree::ensure_dir(dest)?;
    let mut stats = ExtractStats::default();
    let mut dir_modes = Vec::new();

    for entry in &plan {
        let target = dest.join(&entry.rel);

        if entry.is_dir {
            tree::ensure_dir(&target)?;
            dir_modes.push((target, entry.mode.unwrap_or(DEFAULT_DIR_MODE)));
            stats.dirs += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            tree::ensure_dir(parent)?;
        }

        let mut source = zip
            .by_index(entry.index)
            .map_err(|e| SpecifyError::extraction(archive, e))?;
        let mut out = File::create(&target)
            .map_err(|e| SpecifyError::io(format!("creating {}", target.display()), e))?;
        io::copy(&mut source, &mut out).map_err(|e| {
            SpecifyError::extraction(archive, format!("{}: {}", entry.rel.display(), e))
        })?;

        if let Some(mode) = entry.mode {
            tree::set_mode(&target, mode)?;
        }
        stats.files += 1;
    }

    // Directory modes go last so a read-only directory doesn't block its children
    for (dir, mode) in dir_modes.iter().rev() {
        tree::set_mode(dir, *mode)?;
    }

    Ok(stats)
}

/// Extract `archive` into a scratch directory, then merge its payload into
/// `dest`, dropping a lone top-level wrapper directory if there is one
pub fn extract_with_flatten(archive: &Path, dest: &Path) -> SpecifyResult<CopyStats> {
    let scratch = tempfile::Builder::new()
        .prefix("specify-extract-")
        .tempdir()
        .map_err(|e| SpecifyError::io("creating extraction directory", e))?;

    extract_zip(archive, scratch.path())?;
    let payload = payload_root(scratch.path())?;
    if payload != scratch.path() {
        info!(
            "Flattening wrapper directory {}",
            payload.file_name().unwrap_or_default().to_string_lossy()
        );
    }

    tree::merge_directories(&payload, dest)
}

/// The directory holding the real payload of an extracted tree: the single
/// child directory if that is all there is, otherwise `root` itself
pub fn payload_root(root: &Path) -> SpecifyResult<PathBuf> {
    let mut entries = fs::read_dir(root)
        .map_err(|e| SpecifyError::io(format!("reading directory {}", root.display()), e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SpecifyError::io(format!("reading directory {}", root.display()), e))?;

    if entries.len() == 1 {
        let only = entries.remove(0);
        let is_dir = only
            .file_type()
            .map_err(|e| SpecifyError::io(format!("inspecting {}", only.path().display()), e))?
            .is_dir();
        if is_dir {
            return Ok(only.path());
        }
    }

    Ok(root.to_path_buf())
}

fn plan_entries(zip: &mut ZipArchive<File>, archive: &Path) -> SpecifyResult<Vec<PlannedEntry>> {
    let mut plan = Vec::with_capacity(zip.len());

    for index in 0..zip.len() {
        let entry = zip
            .by_index(index)
            .map_err(|e| SpecifyError::extraction(archive, e))?;
        let Some(rel) = sanitize_entry_name(entry.name())? else {
            continue;
        };
        let mode = entry.unix_mode().map(|m| m & 0o7777).filter(|m| *m != 0);
        plan.push(PlannedEntry {
            index,
            rel,
            is_dir: entry.is_dir(),
            mode,
        });
    }

    Ok(plan)
}

/// Turn an archive entry name into a relative path, rejecting anything that
/// could land outside the destination. `Ok(None)` means the name is empty
/// (e.g. `./`).
fn sanitize_entry_name(name: &str) -> SpecifyResult<Option<PathBuf>> {
    let traversal = || SpecifyError::PathTraversal {
        entry: name.to_string(),
    };

    if name.starts_with('/') || name.starts_with('\\') || has_drive_prefix(name) {
        return Err(traversal());
    }

    let mut rel = PathBuf::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return Err(traversal()),
            part => {
                // Guard against platform-specific prefixes sneaking through
                match Path::new(part).components().next() {
                    Some(Component::Normal(_)) => rel.push(part),
                    _ => return Err(traversal()),
                }
            }
        }
    }

    Ok((!rel.as_os_str().is_empty()).then_some(rel))
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Build small archives for tests
#[cfg(test)]
pub(crate) fn write_test_zip(path: &Path, entries: &[(&str, Option<&str>)]) {
    use std::io::Write;
    use zip::write::FileOptions;

    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default();
    for (name, content) in entries {
        match content {
            Some(body) => {
                zip.start_file(*name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            None => zip.add_directory(*name, options).unwrap(),
        }
    }
    zip.finish().unwrap();
}
