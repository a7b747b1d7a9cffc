//! Git integration
//!
//! Everything goes through the `git` executable. The [`GitOps`] trait is
//! the seam the project and feature workflows depend on, so they can be
//! exercised without a real repository.

use crate::error::{SpecifyError, SpecifyResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Commit message for the first commit of a new project
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit from Specify template";

/// Git operations used by specify
#[async_trait]
pub trait GitOps: Send + Sync {
    /// Whether a usable `git` is installed
    async fn is_available(&self) -> bool;

    /// Whether `dir` is inside a work tree
    async fn is_repo(&self, dir: &Path) -> bool;

    /// Top-level directory of the repository containing `dir`
    async fn repo_root(&self, dir: &Path) -> SpecifyResult<PathBuf>;

    /// Name of the checked-out branch
    async fn current_branch(&self, dir: &Path) -> SpecifyResult<String>;

    /// Create `name` from HEAD and switch to it
    async fn create_branch(&self, dir: &Path, name: &str) -> SpecifyResult<()>;

    /// `git init`, stage everything, commit with `message`
    async fn init_and_commit(&self, dir: &Path, message: &str) -> SpecifyResult<()>;

    /// A global config value, if set
    async fn config_value(&self, key: &str) -> Option<String>;
}

/// [`GitOps`] backed by the `git` binary on PATH
#[derive(Debug, Clone, Default)]
pub struct SystemGit;

impl SystemGit {
    pub fn new() -> Self {
        Self
    }

    async fn exec(&self, dir: Option<&Path>, args: &[&str]) -> SpecifyResult<Output> {
        debug!("Executing: git {}", args.join(" "));
        let mut cmd = Command::new("git");
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cmd.output()
            .await
            .map_err(|e| SpecifyError::command_failed(format!("git {}", args.join(" ")), e))
    }

    /// Run git in `dir` and return trimmed stdout, failing on non-zero exit
    async fn run(&self, dir: &Path, args: &[&str]) -> SpecifyResult<String> {
        let output = self.exec(Some(dir), args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SpecifyError::command_exec(
                format!("git {}", args.join(" ")),
                stderr.trim(),
            ))
        }
    }
}

#[async_trait]
impl GitOps for SystemGit {
    async fn is_available(&self) -> bool {
        which::which("git").is_ok()
            && self
                .exec(None, &["--version"])
                .await
                .map(|o| o.status.success())
                .unwrap_or(false)
    }

    async fn is_repo(&self, dir: &Path) -> bool {
        self.run(dir, &["rev-parse", "--is-inside-work-tree"])
            .await
            .map(|out| out == "true")
            .unwrap_or(false)
    }

    async fn repo_root(&self, dir: &Path) -> SpecifyResult<PathBuf> {
        self.run(dir, &["rev-parse", "--show-toplevel"])
            .await
            .map(PathBuf::from)
    }

    async fn current_branch(&self, dir: &Path) -> SpecifyResult<String> {
        self.run(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    async fn create_branch(&self, dir: &Path, name: &str) -> SpecifyResult<()> {
        self.run(dir, &["checkout", "-b", name]).await.map(|_| ())
    }

    async fn init_and_commit(&self, dir: &Path, message: &str) -> SpecifyResult<()> {
        self.run(dir, &["init"]).await?;
        self.run(dir, &["add", "."]).await?;
        self.run(dir, &["commit", "-m", message]).await?;
        Ok(())
    }

    async fn config_value(&self, key: &str) -> Option<String> {
        let output = self
            .exec(None, &["config", "--global", "--get", key])
            .await
            .ok()?;
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (output.status.success() && !value.is_empty()).then_some(value)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeGit;
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn fake_git_tracks_branches() {
        let temp = TempDir::new().unwrap();
        let git = FakeGit::repo(temp.path(), "main");

        assert!(git.is_repo(&temp.path().join("sub")).await);
        assert_eq!(git.repo_root(temp.path()).await.unwrap(), temp.path());
        git.create_branch(temp.path(), "001-thing").await.unwrap();
        assert_eq!(git.current_branch(temp.path()).await.unwrap(), "001-thing");
    }

    #[tokio::test]
    async fn system_git_outside_repo() {
        let git = SystemGit::new();
        if !git.is_available().await {
            return;
        }
        let temp = TempDir::new().unwrap();
        assert!(!git.is_repo(temp.path()).await);
        assert!(git.repo_root(temp.path()).await.is_err());
    }
}
