//! Configuration management for Specify

pub mod schema;

pub use schema::{Config, GeneralConfig, InitConfig, TemplatesConfig};

use crate::error::{SpecifyError, SpecifyResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use toml_edit::{value, DocumentMut, Item, Table};
use tracing::{debug, info};

/// Keys accepted by `specify config set`
pub const SETTABLE_KEYS: [&str; 9] = [
    "general.log_format",
    "templates.cache_dir",
    "templates.repo_owner",
    "templates.repo_name",
    "templates.asset_name",
    "templates.api_base",
    "templates.timeout_secs",
    "init.default_agent",
    "init.git",
];

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("specify")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub async fn load(&self) -> SpecifyResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> SpecifyResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SpecifyError::io(format!("reading config from {}", path.display()), e))?;

        parse_config(path, &content)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> SpecifyResult<()> {
        let content = toml::to_string_pretty(config)?;
        self.write(&content).await?;
        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Set one dotted key in the config file, keeping the rest of the file
    /// (comments and layout included) as it is
    pub async fn set_value(&self, key: &str, raw: &str) -> SpecifyResult<Config> {
        let content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path).await.map_err(|e| {
                SpecifyError::io(format!("reading config from {}", self.config_path.display()), e)
            })?
        } else {
            String::new()
        };

        let updated = set_in_document(&content, key, raw).map_err(|reason| {
            SpecifyError::ConfigInvalid {
                path: self.config_path.clone(),
                reason,
            }
        })?;
        // Reject values the schema would not load
        let config = parse_config(&self.config_path, &updated)?;

        self.write(&updated).await?;
        info!("Set {} in {}", key, self.config_path.display());
        Ok(config)
    }

    async fn write(&self, content: &str) -> SpecifyResult<()> {
        self.ensure_config_dir().await?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SpecifyError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> SpecifyResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SpecifyError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_config(path: &Path, content: &str) -> SpecifyResult<Config> {
    toml::from_str(content).map_err(|e| SpecifyError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write `raw` under `key` in TOML text, typed by the key
fn set_in_document(content: &str, key: &str, raw: &str) -> Result<String, String> {
    let (section, field) = key
        .split_once('.')
        .filter(|_| SETTABLE_KEYS.contains(&key))
        .ok_or_else(|| {
            format!(
                "unknown key '{}', expected one of: {}",
                key,
                SETTABLE_KEYS.join(", ")
            )
        })?;

    let item = match key {
        "templates.timeout_secs" => {
            let secs: i64 = raw
                .parse()
                .map_err(|_| format!("{} must be a whole number of seconds", key))?;
            value(secs)
        }
        "init.git" => value(parse_bool(raw)?),
        _ => value(raw),
    };

    let mut doc: DocumentMut = content.parse().map_err(|e| format!("{}", e))?;
    let table = doc
        .entry(section)
        .or_insert_with(|| Item::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| format!("[{}] is not a table", section))?;
    table.insert(field, item);
    Ok(doc.to_string())
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(format!("Invalid boolean value: {}. Use true/false", raw)),
    }
}
