//! Cache-first template resolution with a single automatic resync

use super::TemplateCache;
use crate::agent::Agent;
use crate::error::{SpecifyError, SpecifyResult};
use crate::remote::{ProgressFn, TemplateSource};
use crate::template::Placement;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Release tag the archive came from
    pub release: String,
    pub asset: String,
    pub bytes: u64,
    /// Files recorded in the rebuilt manifest
    pub entries: usize,
}

/// Result of a resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    pub placement: Placement,
    /// Present when the cache had to be synced first
    pub synced: Option<SyncReport>,
}

#[derive(Debug)]
enum ResolveState {
    CacheHit,
    Syncing,
    Retry(SyncReport),
}

/// Serves template trees from the cache, syncing from a source on demand
pub struct TemplateResolver<'a> {
    cache: &'a TemplateCache,
    source: &'a dyn TemplateSource,
    asset_name: String,
    progress: Option<Arc<ProgressFn>>,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(
        cache: &'a TemplateCache,
        source: &'a dyn TemplateSource,
        asset_name: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            source,
            asset_name: asset_name.into(),
            progress: None,
        }
    }

    /// Report download progress to `progress`
    pub fn with_progress(mut self, progress: Arc<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Download the latest release and merge it into the cache.
    ///
    /// The archive lives in a scratch directory that is removed on every
    /// exit path.
    pub fn sync(&self) -> SpecifyResult<SyncReport> {
        let release = self.source.latest_release()?;
        let asset = release.find_asset(&self.asset_name)?;
        info!(
            "Syncing templates from {} ({}, {})",
            self.source.describe(),
            release.tag_name,
            asset.name
        );

        let scratch = tempfile::Builder::new()
            .prefix("specify-download-")
            .tempdir()
            .map_err(|e| SpecifyError::io("creating download directory", e))?;
        let file_name = Path::new(&asset.name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "templates.zip".into());
        let archive_path = scratch.path().join(file_name);

        let bytes = {
            let file = File::create(&archive_path).map_err(|e| {
                SpecifyError::io(format!("creating {}", archive_path.display()), e)
            })?;
            let mut out = BufWriter::new(file);
            self.source
                .download(asset, &mut out, self.progress.as_deref())?
        };
        debug!("Downloaded {} bytes to {}", bytes, archive_path.display());

        let manifest = self.cache.ingest_archive(&archive_path)?;
        Ok(SyncReport {
            release: release.tag_name.clone(),
            asset: asset.name.clone(),
            bytes,
            entries: manifest.entries.len(),
        })
    }

    /// Place the cached template tree into `target` for `agent`, syncing
    /// once if the cache cannot serve it
    pub fn resolve(&self, target: &Path, agent: Agent) -> SpecifyResult<Resolution> {
        let mut state = ResolveState::CacheHit;
        loop {
            debug!("Template resolution state: {:?}", state);
            state = match state {
                ResolveState::CacheHit => match self.extract_from_cache(target, agent) {
                    Ok(placement) => {
                        info!("Template cache hit at {}", self.cache.root().display());
                        return Ok(Resolution {
                            placement,
                            synced: None,
                        });
                    }
                    Err(e) => {
                        info!("Template cache unusable ({}), syncing", e);
                        ResolveState::Syncing
                    }
                },
                ResolveState::Syncing => match self.sync() {
                    Ok(report) => ResolveState::Retry(report),
                    Err(e) => {
                        warn!("Template sync failed: {}", e);
                        return Err(SpecifyError::SyncRequired {
                            reason: e.to_string(),
                        });
                    }
                },
                ResolveState::Retry(report) => {
                    return match self.extract_from_cache(target, agent) {
                        Ok(placement) => Ok(Resolution {
                            placement,
                            synced: Some(report),
                        }),
                        Err(e) => {
                            warn!("Templates still unusable after sync: {}", e);
                            Err(SpecifyError::SyncRequired {
                                reason: e.to_string(),
                            })
                        }
                    };
                }
            };
        }
    }

    fn extract_from_cache(&self, target: &Path, agent: Agent) -> SpecifyResult<Placement> {
        if self.cache.is_empty()? {
            return Err(SpecifyError::NotFound(format!(
                "no templates cached at {}",
                self.cache.root().display()
            )));
        }
        self.cache.extract_to(target, agent)
    }
}
