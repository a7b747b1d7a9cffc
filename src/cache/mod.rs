//! Persistent template cache
//!
//! One user-global directory (default `~/.spec-kit/templates`) holds the
//! latest synced template release plus a manifest of SHA-256 digests.
//! Projects are initialized from the cache; the network is only touched
//! when the cache cannot serve the request.
//!
//! # Resolution States
//!
//! | State     | Entered when                      | Next                       |
//! |-----------|-----------------------------------|----------------------------|
//! | CacheHit  | manifest present, files present   | Success, or Syncing        |
//! | Syncing   | cache empty or any cache failure  | Retry, or Failure          |
//! | Retry     | sync finished                     | Success, or Failure        |
//!
//! There is exactly one automatic sync per resolution. No cross-process
//! locking is done: concurrent writers race on the manifest and the last
//! one wins.

pub mod manifest;
pub mod resolver;

pub use manifest::{hash_file, versions_compatible, CacheManifest, DEV_VERSION, MANIFEST_FILE};
pub use resolver::{Resolution, SyncReport, TemplateResolver};

use crate::agent::Agent;
use crate::archive;
use crate::error::{SpecifyError, SpecifyResult};
use crate::template::{Placement, Placer};
use crate::tree;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directory under the cache root holding document templates; never placed
pub const CONTENT_DIR: &str = "content";

/// Cache entries that are not part of a project's template tree
const NON_TEMPLATE_ENTRIES: [&str; 2] = [MANIFEST_FILE, CONTENT_DIR];

/// Version written to and expected from the manifest
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The on-disk template cache
#[derive(Debug, Clone)]
pub struct TemplateCache {
    root: PathBuf,
    version: String,
}

impl TemplateCache {
    /// A cache at `root` for the running tool version
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            version: TOOL_VERSION.to_string(),
        }
    }

    /// Override the version used for compatibility checks
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Open the cache at `override_dir`, or the default location
    pub fn open(override_dir: Option<&Path>) -> SpecifyResult<Self> {
        Ok(Self::new(Self::resolve_root(override_dir)?))
    }

    /// `override_dir` if given, else `<home>/.spec-kit/templates`
    pub fn resolve_root(override_dir: Option<&Path>) -> SpecifyResult<PathBuf> {
        if let Some(dir) = override_dir {
            return Ok(dir.to_path_buf());
        }
        dirs::home_dir()
            .map(|home| home.join(".spec-kit").join("templates"))
            .ok_or_else(|| SpecifyError::Internal("could not determine home directory".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Empty means no manifest, or no file besides the manifest anywhere
    /// under the root
    pub fn is_empty(&self) -> SpecifyResult<bool> {
        if !self.manifest_path().is_file() {
            return Ok(true);
        }

        let manifest_path = self.manifest_path();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|e| {
                SpecifyError::io(format!("walking {}", self.root.display()), e.into())
            })?;
            if entry.file_type().is_file() && entry.path() != manifest_path {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn read_manifest(&self) -> SpecifyResult<CacheManifest> {
        CacheManifest::load(&self.root)
    }

    pub fn write_manifest(&self, manifest: &CacheManifest) -> SpecifyResult<()> {
        manifest.save(&self.root)
    }

    /// Hash the current cache contents and persist a fresh manifest
    pub fn rebuild_manifest(&self) -> SpecifyResult<CacheManifest> {
        let manifest = CacheManifest::build(&self.root, &self.version)?;
        self.write_manifest(&manifest)?;
        debug!(
            "Wrote manifest with {} entries to {}",
            manifest.entries.len(),
            self.manifest_path().display()
        );
        Ok(manifest)
    }

    /// Load the manifest, then check version and every digest
    pub fn validate(&self) -> SpecifyResult<CacheManifest> {
        let manifest = self.read_manifest()?;
        manifest.check_version(&self.version)?;
        manifest.validate(&self.root)?;
        Ok(manifest)
    }

    /// Validate the cache, then place its template tree into `target`
    pub fn extract_to(&self, target: &Path, agent: Agent) -> SpecifyResult<Placement> {
        self.validate()?;
        Placer::new(&self.root)
            .ignoring(&NON_TEMPLATE_ENTRIES)
            .place(target, agent)
    }

    /// Unpack a release archive over the cache and re-hash everything.
    ///
    /// Existing cache files absent from the archive are kept.
    pub fn ingest_archive(&self, archive_path: &Path) -> SpecifyResult<CacheManifest> {
        tree::ensure_dir(&self.root)?;
        let stats = archive::extract_with_flatten(archive_path, &self.root)?;
        debug!("Merged {} files into cache", stats.files);
        self.rebuild_manifest()
    }

    /// A document template shipped under `content/`, if present
    pub fn document_template(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(CONTENT_DIR).join(name);
        path.is_file().then_some(path)
    }

    /// Snapshot for `templates status`
    pub fn status(&self) -> CacheStatus {
        let exists = self.root.is_dir();
        let (empty, unreadable) = emptiness(self.is_empty());
        let manifest = self.read_manifest().ok();
        let validation = match unreadable {
            Some(problem) => Err(problem),
            None if empty => Err("cache is empty".to_string()),
            None => self.validate().map(|_| ()).map_err(|e| e.to_string()),
        };

        CacheStatus {
            root: self.root.clone(),
            exists,
            empty,
            tool_version: self.version.clone(),
            cache_version: manifest.as_ref().map(|m| m.tool_version.clone()),
            last_sync: manifest.as_ref().map(|m| m.last_sync),
            entries: manifest.as_ref().map(|m| m.entries.len()).unwrap_or(0),
            valid: validation.is_ok(),
            problem: validation.err(),
        }
    }
}

/// An unreadable cache is reported as a problem, not as empty
fn emptiness(result: SpecifyResult<bool>) -> (bool, Option<String>) {
    match result {
        Ok(empty) => (empty, None),
        Err(e) => (false, Some(e.to_string())),
    }
}

/// Reported state of the cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub root: PathBuf,
    pub exists: bool,
    pub empty: bool,
    pub tool_version: String,
    pub cache_version: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
    pub entries: usize,
    pub valid: bool,
    pub problem: Option<String>,
}
