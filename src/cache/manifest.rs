//! Cache manifest: tool version, sync time and a digest per cached file
//!
//! Stored as `.manifest.json` at the cache root:
//!
//! ```json
//! {
//!   "spec_kit_version": "0.3.0",
//!   "last_sync": "2025-01-01T00:00:00Z",
//!   "templates": { "memory/constitution.md": "<sha256 hex>" }
//! }
//! ```

use crate::error::{SpecifyError, SpecifyResult};
use crate::tree;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Manifest file name at the cache root
pub const MANIFEST_FILE: &str = ".manifest.json";

/// Version string of local development builds; compatible with any version
pub const DEV_VERSION: &str = "dev";

/// Length of a hex-encoded SHA-256 digest
const DIGEST_HEX_LEN: usize = 64;

/// Integrity and freshness record for the template cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Version of the tool that wrote the cache
    #[serde(rename = "spec_kit_version")]
    pub tool_version: String,
    pub last_sync: DateTime<Utc>,
    /// Relative path (`/`-separated) to hex digest
    #[serde(rename = "templates", default)]
    pub entries: BTreeMap<String, String>,
}

impl CacheManifest {
    /// An empty manifest stamped with `version` and the current time
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            tool_version: version.into(),
            last_sync: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    /// Hash every file under `root` except the manifest itself
    pub fn build(root: &Path, version: &str) -> SpecifyResult<Self> {
        let mut manifest = Self::new(version);
        let manifest_path = root.join(MANIFEST_FILE);

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry
                .map_err(|e| SpecifyError::io(format!("walking {}", root.display()), e.into()))?;
            if !entry.file_type().is_file() || entry.path() == manifest_path {
                continue;
            }
            let key = manifest_key(root, entry.path())?;
            manifest.entries.insert(key, hash_file(entry.path())?);
        }

        debug!("Hashed {} cache files under {}", manifest.entries.len(), root.display());
        Ok(manifest)
    }

    /// Read the manifest from `root`
    pub fn load(root: &Path) -> SpecifyResult<Self> {
        let path = root.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(SpecifyError::ManifestMissing(path));
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| SpecifyError::io(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&content)
            .map_err(|e| SpecifyError::Corrupted(format!("unreadable manifest: {}", e)))
    }

    /// Persist as pretty JSON at `root`
    pub fn save(&self, root: &Path) -> SpecifyResult<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        tree::atomic_write(&root.join(MANIFEST_FILE), json.as_bytes())
    }

    /// Whether a cache written by this manifest's tool can serve `current`
    pub fn is_compatible_with(&self, current: &str) -> bool {
        versions_compatible(&self.tool_version, current)
    }

    /// Fail with a version mismatch unless compatible with `current`
    pub fn check_version(&self, current: &str) -> SpecifyResult<()> {
        if self.is_compatible_with(current) {
            Ok(())
        } else {
            Err(SpecifyError::VersionMismatch {
                cache: self.tool_version.clone(),
                current: current.to_string(),
            })
        }
    }

    /// Verify every entry against the files under `root`.
    ///
    /// Reports the first offending entry in path order. Read-only.
    pub fn validate(&self, root: &Path) -> SpecifyResult<()> {
        for (key, expected) in &self.entries {
            let path = entry_path(root, key)?;
            if !is_valid_digest(expected) {
                return Err(SpecifyError::Corrupted(format!(
                    "invalid digest for {}: {}",
                    key, expected
                )));
            }
            if !path.is_file() {
                return Err(SpecifyError::CacheFileMissing(key.clone()));
            }
            let actual = hash_file(&path)?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(SpecifyError::HashMismatch {
                    path: key.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Exact match, unless either side is the development sentinel
pub fn versions_compatible(cache: &str, current: &str) -> bool {
    cache == DEV_VERSION || current == DEV_VERSION || cache == current
}

/// SHA-256 of a file's contents as lowercase hex
pub fn hash_file(path: &Path) -> SpecifyResult<String> {
    let context = || format!("hashing {}", path.display());
    let mut file = File::open(path).map_err(|e| SpecifyError::io(context(), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| SpecifyError::io(context(), e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// A hex digest of the right length; either case is accepted
pub fn is_valid_digest(digest: &str) -> bool {
    digest.len() == DIGEST_HEX_LEN && digest.bytes().all(|b| b.is_ascii_hexdigit())
}

/// `/`-separated key for a file under `root`
fn manifest_key(root: &Path, path: &Path) -> SpecifyResult<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        SpecifyError::Internal(format!("{} is not under {}", path.display(), root.display()))
    })?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Resolve a manifest key beneath `root`, refusing keys that leave it
fn entry_path(root: &Path, key: &str) -> SpecifyResult<PathBuf> {
    let corrupted = || SpecifyError::Corrupted(format!("invalid manifest path: {}", key));

    if key.is_empty() || key.starts_with('/') || key.starts_with('\\') {
        return Err(corrupted());
    }
    let mut path = root.to_path_buf();
    for part in key.split('/') {
        if part.is_empty() || part == "." || part == ".." || part.contains('\\') {
            return Err(corrupted());
        }
        path.push(part);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn cache_with(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = temp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp
    }

    #[test]
    fn hash_is_sha256_hex() {
        let temp = cache_with(&[("a.txt", "hello")]);
        assert_eq!(hash_file(&temp.path().join("a.txt")).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn digest_validation() {
        assert!(is_valid_digest(HELLO_SHA256));
        assert!(is_valid_digest(&HELLO_SHA256.to_uppercase()));
        assert!(!is_valid_digest("abc123"));
        assert!(!is_valid_digest(&format!("{}zz", &HELLO_SHA256[..62])));
    }

    #[test]
    fn version_compatibility() {
        assert!(versions_compatible("1.0.0", "1.0.0"));
        assert!(!versions_compatible("1.0.0", "1.1.0"));
        assert!(versions_compatible("dev", "1.1.0"));
        assert!(versions_compatible("1.1.0", "dev"));
        assert!(versions_compatible("dev", "dev"));
    }

    #[test]
    fn build_skips_manifest_and_uses_forward_slashes() {
        let temp = cache_with(&[
            ("memory/constitution.md", "hello"),
            ("commands/plan.md", "plan"),
            (MANIFEST_FILE, "{}"),
        ]);

        let manifest = CacheManifest::build(temp.path(), "1.0.0").unwrap();
        let keys: Vec<_> = manifest.entries.keys().cloned().collect();
        assert_eq!(keys, vec!["commands/plan.md", "memory/constitution.md"]);
        assert_eq!(manifest.entries["memory/constitution.md"], HELLO_SHA256);
        assert_eq!(manifest.tool_version, "1.0.0");
    }

    #[test]
    fn save_and_load_use_wire_field_names() {
        let temp = cache_with(&[("a.txt", "hello")]);
        let manifest = CacheManifest::build(temp.path(), "1.0.0").unwrap();
        manifest.save(temp.path()).unwrap();

        let raw = fs::read_to_string(temp.path().join(MANIFEST_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["spec_kit_version"], "1.0.0");
        assert_eq!(json["templates"]["a.txt"], HELLO_SHA256);
        assert!(json["last_sync"].is_string());

        assert_eq!(CacheManifest::load(temp.path()).unwrap(), manifest);
    }

    #[test]
    fn load_missing_and_corrupt() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            CacheManifest::load(temp.path()).unwrap_err(),
            SpecifyError::ManifestMissing(_)
        ));

        fs::write(temp.path().join(MANIFEST_FILE), "not json").unwrap();
        let err = CacheManifest::load(temp.path()).unwrap_err();
        assert!(matches!(err, SpecifyError::Corrupted(_)));
        assert!(err.is_cache_fault());
    }

    #[test]
    fn validate_accepts_intact_cache() {
        let temp = cache_with(&[("a.txt", "hello"), ("sub/b.txt", "b")]);
        let manifest = CacheManifest::build(temp.path(), "1.0.0").unwrap();
        manifest.validate(temp.path()).unwrap();
    }

    #[test]
    fn validate_accepts_uppercase_digest() {
        let temp = cache_with(&[("a.txt", "hello")]);
        let mut manifest = CacheManifest::new("1.0.0");
        manifest
            .entries
            .insert("a.txt".into(), HELLO_SHA256.to_uppercase());
        manifest.validate(temp.path()).unwrap();
    }

    #[test]
    fn validate_reports_first_missing_file() {
        let temp = cache_with(&[("b.txt", "b")]);
        let mut manifest = CacheManifest::build(temp.path(), "1.0.0").unwrap();
        manifest.entries.insert("a.txt".into(), HELLO_SHA256.into());
        manifest.entries.insert("c.txt".into(), HELLO_SHA256.into());

        match manifest.validate(temp.path()).unwrap_err() {
            SpecifyError::CacheFileMissing(path) => assert_eq!(path, "a.txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_reports_mismatch_with_both_digests() {
        let temp = cache_with(&[("a.txt", "hello")]);
        let manifest = CacheManifest::build(temp.path(), "1.0.0").unwrap();
        fs::write(temp.path().join("a.txt"), "tampered").unwrap();

        match manifest.validate(temp.path()).unwrap_err() {
            SpecifyError::HashMismatch {
                path,
                expected,
                actual,
            } => {
                assert_eq!(path, "a.txt");
                assert_eq!(expected, HELLO_SHA256);
                assert_ne!(actual, expected);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_rejects_escaping_keys() {
        let temp = cache_with(&[("a.txt", "hello")]);
        for key in ["../a.txt", "/etc/passwd", "sub/../../x", ""] {
            let mut manifest = CacheManifest::new("1.0.0");
            manifest.entries.insert(key.into(), HELLO_SHA256.into());
            assert!(
                matches!(manifest.validate(temp.path()), Err(SpecifyError::Corrupted(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn validate_rejects_malformed_digest() {
        let temp = cache_with(&[("a.txt", "hello")]);
        let mut manifest = CacheManifest::new("1.0.0");
        manifest.entries.insert("a.txt".into(), "abc".into());
        assert!(matches!(
            manifest.validate(temp.path()),
            Err(SpecifyError::Corrupted(_))
        ));
    }

    #[test]
    fn check_version_mismatch() {
        let manifest = CacheManifest::new("0.1.0");
        assert!(manifest.check_version("0.1.0").is_ok());
        assert!(matches!(
            manifest.check_version("0.2.0"),
            Err(SpecifyError::VersionMismatch { .. })
        ));
    }
}
