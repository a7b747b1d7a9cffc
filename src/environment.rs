//! Environment inspection for `specify check`
//!
//! Nothing here fails on a missing tool; every probe records what it found.

use crate::agent::Agent;
use crate::cache::{CacheStatus, TemplateCache};
use crate::git::GitOps;
use crate::remote;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// An executable looked up on PATH
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub install_hint: Option<String>,
}

impl ToolStatus {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// Result of probing the template source
#[derive(Debug, Clone, Serialize)]
pub struct Connectivity {
    pub url: String,
    pub reachable: bool,
    pub error: Option<String>,
}

/// Git installation and identity
#[derive(Debug, Clone, Serialize)]
pub struct GitStatus {
    pub available: bool,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Everything `specify check` reports
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub platform: String,
    pub cwd: Option<PathBuf>,
    pub connectivity: Connectivity,
    pub git: GitStatus,
    pub agents: Vec<ToolStatus>,
    pub cache: CacheStatus,
}

impl EnvironmentReport {
    /// Whether templates can be obtained: from the network or a valid cache
    pub fn can_initialize(&self) -> bool {
        self.connectivity.reachable || self.cache.valid
    }
}

/// Operating system and architecture, e.g. `linux/x86_64`
pub fn platform() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Gather the report. The connectivity probe and cache validation block,
/// so they run off the async runtime.
pub async fn inspect(
    api_base: &str,
    timeout: Duration,
    git: &dyn GitOps,
    cache: &TemplateCache,
) -> EnvironmentReport {
    let url = api_base.to_string();
    let probe_cache = cache.clone();
    let blocking = tokio::task::spawn_blocking(move || {
        let connectivity = match remote::check_connectivity(&url, timeout) {
            Ok(()) => Connectivity {
                url,
                reachable: true,
                error: None,
            },
            Err(e) => Connectivity {
                url,
                reachable: false,
                error: Some(e.to_string()),
            },
        };
        (connectivity, probe_cache.status())
    });

    let git_status = git_status(git).await;
    let mut agents = Vec::new();
    for agent in Agent::ALL {
        if let Some(tool) = agent.cli_tool() {
            agents.push(probe_tool(tool, Some(agent.install_hint())).await);
        }
    }

    let (connectivity, cache_status) = match blocking.await {
        Ok(pair) => pair,
        Err(e) => {
            debug!("environment probe task failed: {}", e);
            (
                Connectivity {
                    url: api_base.to_string(),
                    reachable: false,
                    error: Some(e.to_string()),
                },
                cache.status(),
            )
        }
    };

    EnvironmentReport {
        platform: platform(),
        cwd: std::env::current_dir().ok(),
        connectivity,
        git: git_status,
        agents,
        cache: cache_status,
    }
}

async fn git_status(git: &dyn GitOps) -> GitStatus {
    if !git.is_available().await {
        return GitStatus {
            available: false,
            user_name: None,
            user_email: None,
        };
    }
    GitStatus {
        available: true,
        user_name: git.config_value("user.name").await,
        user_email: git.config_value("user.email").await,
    }
}

/// Locate `name` on PATH and read the first line of `--version`
pub async fn probe_tool(name: &str, install_hint: Option<&str>) -> ToolStatus {
    let path = which::which(name).ok();
    let version = match &path {
        Some(path) => tool_version(path).await,
        None => None,
    };
    ToolStatus {
        name: name.to_string(),
        path,
        version,
        install_hint: install_hint.map(String::from),
    }
}

async fn tool_version(path: &Path) -> Option<String> {
    let output = Command::new(path)
        .arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

/// The agent's CLI, when it needs one and it is not on PATH
pub fn missing_agent_tool(agent: Agent) -> Option<&'static str> {
    agent
        .cli_tool()
        .filter(|tool| which::which(tool).is_err())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGit;
    use tempfile::TempDir;

    #[test]
    fn platform_names_os_and_arch() {
        let platform = platform();
        assert!(platform.starts_with(std::env::consts::OS));
        assert!(platform.contains('/'));
    }

    #[test]
    fn agents_without_cli_are_never_missing() {
        assert_eq!(missing_agent_tool(Agent::Copilot), None);
        assert_eq!(missing_agent_tool(Agent::Codex), None);
    }

    #[tokio::test]
    async fn missing_tool_is_reported_not_fatal() {
        let status = probe_tool("specify-no-such-tool-xyz", Some("https://example.invalid")).await;
        assert!(!status.found());
        assert!(status.version.is_none());
        assert_eq!(status.install_hint.as_deref(), Some("https://example.invalid"));
    }

    #[tokio::test]
    async fn unreachable_source_and_empty_cache() {
        let temp = TempDir::new().unwrap();
        let cache = TemplateCache::new(temp.path().join("cache"));
        let git = FakeGit::no_repo();

        let report = inspect(
            "http://127.0.0.1:9",
            Duration::from_millis(500),
            &git,
            &cache,
        )
        .await;

        assert!(!report.connectivity.reachable);
        assert!(report.connectivity.error.is_some());
        assert!(report.git.available);
        assert_eq!(report.git.user_name.as_deref(), Some("Test User"));
        assert!(!report.cache.valid);
        assert!(!report.can_initialize());
        assert_eq!(report.agents.len(), 2);
    }
}
