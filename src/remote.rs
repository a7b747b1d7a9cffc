//! Template release sources
//!
//! The cache only needs "bytes of an archive with this name". Releases come
//! from the GitHub releases API, or from a local ZIP for offline syncs.

use crate::config::TemplatesConfig;
use crate::error::{SpecifyError, SpecifyResult};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Download progress callback: bytes so far, total if known
pub type ProgressFn = dyn Fn(u64, Option<u64>) + Send + Sync;

/// User agent sent with every request
pub fn user_agent() -> String {
    format!("specify-cli/{}", env!("CARGO_PKG_VERSION"))
}

/// A published release
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable file attached to a release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub browser_download_url: String,
}

impl Release {
    /// The asset called `name`, else the first `.zip` asset
    pub fn find_asset(&self, name: &str) -> SpecifyResult<&ReleaseAsset> {
        self.assets
            .iter()
            .find(|a| a.name == name)
            .or_else(|| self.assets.iter().find(|a| a.name.ends_with(".zip")))
            .ok_or_else(|| SpecifyError::AssetNotFound {
                asset: name.to_string(),
                release: self.tag_name.clone(),
            })
    }
}

/// Somewhere template releases can be fetched from
pub trait TemplateSource: Send + Sync {
    /// Short description for messages
    fn describe(&self) -> String;

    /// Metadata of the newest release
    fn latest_release(&self) -> SpecifyResult<Release>;

    /// Stream `asset` into `out`, returning the byte count
    fn download(
        &self,
        asset: &ReleaseAsset,
        out: &mut dyn Write,
        progress: Option<&ProgressFn>,
    ) -> SpecifyResult<u64>;
}

/// Copy `reader` to `out` in chunks, reporting progress after each
fn copy_with_progress(
    reader: &mut dyn Read,
    out: &mut dyn Write,
    total: Option<u64>,
    progress: Option<&ProgressFn>,
) -> io::Result<u64> {
    let mut buf = [0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        written += n as u64;
        if let Some(report) = progress {
            report(written, total);
        }
    }
    out.flush()?;
    Ok(written)
}

/// GitHub releases of a repository
pub struct GitHubSource {
    agent: ureq::Agent,
    api_base: String,
    owner: String,
    repo: String,
}

impl GitHubSource {
    pub fn new(
        api_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            agent: http_agent(timeout),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base, self.owner, self.repo
        )
    }
}

impl TemplateSource for GitHubSource {
    fn describe(&self) -> String {
        format!("github.com/{}/{}", self.owner, self.repo)
    }

    fn latest_release(&self) -> SpecifyResult<Release> {
        let url = self.release_url();
        debug!("Fetching latest release from {}", url);

        let mut response = self
            .agent
            .get(&url)
            .header("User-Agent", &user_agent())
            .header("Accept", "application/vnd.github+json")
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(404) => {
                    SpecifyError::NotFound(format!("no published release at {}", url))
                }
                e => SpecifyError::DownloadFailed {
                    url: url.clone(),
                    reason: e.to_string(),
                },
            })?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| SpecifyError::DownloadFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&body).map_err(|e| {
            SpecifyError::Corrupted(format!("unreadable release metadata from {}: {}", url, e))
        })
    }

    fn download(
        &self,
        asset: &ReleaseAsset,
        out: &mut dyn Write,
        progress: Option<&ProgressFn>,
    ) -> SpecifyResult<u64> {
        let url = &asset.browser_download_url;
        let failed = |reason: String| SpecifyError::DownloadFailed {
            url: url.clone(),
            reason,
        };
        debug!("Downloading {} from {}", asset.name, url);

        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", &user_agent())
            .call()
            .map_err(|e| failed(e.to_string()))?;

        let total = response
            .body()
            .content_length()
            .or((asset.size > 0).then_some(asset.size));
        let mut reader = response.body_mut().as_reader();
        copy_with_progress(&mut reader, out, total, progress).map_err(|e| failed(e.to_string()))
    }
}

/// Probe `url` with a GET; any response, even an error status, counts as
/// reachable
pub fn check_connectivity(url: &str, timeout: Duration) -> SpecifyResult<()> {
    match http_agent(timeout)
        .get(url)
        .header("User-Agent", &user_agent())
        .call()
    {
        Ok(_) | Err(ureq::Error::StatusCode(_)) => Ok(()),
        Err(e) => Err(SpecifyError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn http_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// A ZIP already on disk, presented as a one-asset release
pub struct LocalArchiveSource {
    path: PathBuf,
}

impl LocalArchiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TemplateSource for LocalArchiveSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn latest_release(&self) -> SpecifyResult<Release> {
        let meta = std::fs::metadata(&self.path)
            .map_err(|_| SpecifyError::PathNotFound(self.path.clone()))?;
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "templates.zip".to_string());

        Ok(Release {
            tag_name: "local".to_string(),
            assets: vec![ReleaseAsset {
                name,
                size: meta.len(),
                browser_download_url: self.path.display().to_string(),
            }],
        })
    }

    fn download(
        &self,
        asset: &ReleaseAsset,
        out: &mut dyn Write,
        progress: Option<&ProgressFn>,
    ) -> SpecifyResult<u64> {
        let mut file = File::open(&self.path)
            .map_err(|e| SpecifyError::io(format!("opening {}", self.path.display()), e))?;
        let total = (asset.size > 0).then_some(asset.size);
        copy_with_progress(&mut file, out, total, progress)
            .map_err(|e| SpecifyError::io(format!("reading {}", self.path.display()), e))
    }
}

/// The configured GitHub releases, or `archive` when given
pub fn create_source(config: &TemplatesConfig, archive: Option<&Path>) -> Arc<dyn TemplateSource> {
    match archive {
        Some(path) => Arc::new(LocalArchiveSource::new(path)),
        None => Arc::new(GitHubSource::new(
            config.api_base.clone(),
            config.repo_owner.clone(),
            config.repo_name.clone(),
            config.timeout(),
        )),
    }
}
