//! Error types for Specify
//!
//! All modules use `SpecifyResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Specify operations
pub type SpecifyResult<T> = Result<T, SpecifyError>;

/// All errors that can occur in Specify
#[derive(Error, Debug)]
pub enum SpecifyError {
    // Template source errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Asset {asset} not found in release {release}")]
    AssetNotFound { asset: String, release: String },

    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    // Archive errors
    #[error("Failed to extract {archive}: {reason}")]
    ExtractionFailed { archive: PathBuf, reason: String },

    #[error("Archive entry escapes the destination directory: {entry}")]
    PathTraversal { entry: String },

    // Cache errors
    #[error("Cache manifest not found at {0}")]
    ManifestMissing(PathBuf),

    #[error("Template cache is corrupted: {0}")]
    Corrupted(String),

    #[error("Cached file missing: {0}")]
    CacheFileMissing(String),

    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Cache version mismatch: cache has {cache}, current is {current}")]
    VersionMismatch { cache: String, current: String },

    #[error("Failed to prepare templates automatically: {reason}")]
    SyncRequired { reason: String },

    // Document errors
    #[error("Malformed delimited section in {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("Failed to render template {path}: {reason}")]
    TemplateRender { path: PathBuf, reason: String },

    // Project errors
    #[error("Directory already exists: {0}")]
    ProjectExists(PathBuf),

    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),

    // Feature workflow errors
    #[error("Not on a feature branch. Current branch: {0}. Feature branches should be named like: 001-feature-name")]
    NotFeatureBranch(String),

    #[error("No AI assistant directory found (looking for .claude, .codex, .gemini, or .copilot)")]
    AgentNotDetected,

    #[error("Invalid agent '{name}', must be one of: {valid}")]
    InvalidAgent { name: String, valid: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SpecifyError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create an extraction error for an archive
    pub fn extraction(archive: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::ExtractionFailed {
            archive: archive.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error invalidates the template cache (and a resync may fix it)
    pub fn is_cache_fault(&self) -> bool {
        matches!(
            self,
            Self::ManifestMissing(_)
                | Self::Corrupted(_)
                | Self::CacheFileMissing(_)
                | Self::HashMismatch { .. }
                | Self::VersionMismatch { .. }
        )
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DownloadFailed { .. }) || self.is_cache_fault()
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SyncRequired { .. } => Some("Run: specify templates sync"),
            Self::DownloadFailed { .. } => Some("Check your network connection, then run: specify templates sync"),
            Self::HashMismatch { .. } | Self::CacheFileMissing(_) | Self::Corrupted(_) => {
                Some("Run: specify templates sync --force")
            }
            Self::MalformedDocument { .. } => {
                Some("Keep exactly one <specify> ... </specify> pair in the file, or remove both markers")
            }
            Self::NotFeatureBranch(_) => Some("Run: specify feature create \"<description>\""),
            Self::AgentNotDetected => Some("Run: specify init --here --ai <agent>"),
            Self::ProjectExists(_) => Some("Choose another name, or run inside it with: specify init --here"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SpecifyError::HashMismatch {
            path: "memory/constitution.md".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("memory/constitution.md"));
        assert!(msg.contains("expected aa"));
        assert!(msg.contains("got bb"));
    }

    #[test]
    fn error_hint() {
        let err = SpecifyError::SyncRequired {
            reason: "offline".to_string(),
        };
        assert_eq!(err.hint(), Some("Run: specify templates sync"));
        assert!(SpecifyError::Internal("x".to_string()).hint().is_none());
    }

    #[test]
    fn error_retryable() {
        let download = SpecifyError::DownloadFailed {
            url: "https://example.invalid".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(download.is_retryable());
        assert!(SpecifyError::Corrupted("bad json".to_string()).is_retryable());
        assert!(!SpecifyError::PathTraversal {
            entry: "../etc/passwd".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn cache_fault_classification() {
        assert!(SpecifyError::ManifestMissing(PathBuf::from("/c/.manifest.json")).is_cache_fault());
        assert!(SpecifyError::VersionMismatch {
            cache: "1.0.0".to_string(),
            current: "1.1.0".to_string(),
        }
        .is_cache_fault());
        assert!(!SpecifyError::User("nope".to_string()).is_cache_fault());
    }
}
