//! Configuration schema for Specify
//!
//! Configuration is stored at `~/.config/specify/config.toml`

use crate::agent::Agent;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Template source and cache settings
    pub templates: TemplatesConfig,

    /// Project initialization defaults
    pub init: InitConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Where templates come from and where they are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Cache directory (default: ~/.spec-kit/templates)
    pub cache_dir: Option<PathBuf>,

    /// GitHub owner of the template repository
    pub repo_owner: String,

    /// GitHub repository publishing template releases
    pub repo_name: String,

    /// Release asset holding the template archive
    pub asset_name: String,

    /// GitHub API base URL
    pub api_base: String,

    /// Network timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            repo_owner: "euforicio".to_string(),
            repo_name: "spec-kit".to_string(),
            asset_name: "spec-kit-cache-template.zip".to_string(),
            api_base: "https://api.github.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl TemplatesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Defaults for `specify init`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// Agent used when --ai is not given
    pub default_agent: Option<Agent>,

    /// Initialize a git repository in new projects
    pub git: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            default_agent: None,
            git: true,
        }
    }
}
