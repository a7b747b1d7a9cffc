//! Project initialization
//!
//! Places the cached templates into a new or existing directory, writes
//! the agent documents and optionally makes the first commit. The template
//! work is blocking and runs on tokio's blocking pool.

pub mod docs;

pub use docs::{write_agent_documents, DocUpdate, AGENTS_FILE, CLAUDE_FILE};

use crate::agent::Agent;
use crate::cache::{SyncReport, TemplateCache, TemplateResolver};
use crate::error::{SpecifyError, SpecifyResult};
use crate::git::{GitOps, INITIAL_COMMIT_MESSAGE};
use crate::remote::{ProgressFn, TemplateSource};
use crate::template::Placement;
use crate::tree;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the project goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectTarget {
    /// A directory that must not exist yet
    New(PathBuf),
    /// An existing directory, merged into
    Here(PathBuf),
}

impl ProjectTarget {
    pub fn path(&self) -> &Path {
        match self {
            Self::New(path) | Self::Here(path) => path,
        }
    }

    pub fn is_here(&self) -> bool {
        matches!(self, Self::Here(_))
    }

    /// Directory name used as the project name
    pub fn name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub target: ProjectTarget,
    pub agent: Agent,
    /// Initialize a git repository if none exists
    pub git: bool,
}

/// What happened with version control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOutcome {
    Initialized,
    /// The project already sits inside a repository
    Existing,
    Skipped(String),
    Failed(String),
}

/// Everything an initialization did
#[derive(Debug, Clone)]
pub struct InitReport {
    pub path: PathBuf,
    pub name: String,
    pub agent: Agent,
    pub here: bool,
    pub placement: Placement,
    pub synced: Option<SyncReport>,
    pub documents: Vec<DocUpdate>,
    pub git: GitOutcome,
}

impl InitReport {
    /// Suggested follow-ups for the user
    pub fn next_steps(&self) -> Vec<String> {
        let mut steps = Vec::new();
        if !self.here {
            steps.push(format!("cd {}", self.name));
        }
        match self.agent {
            Agent::Claude => steps.extend([
                "Open the project with Claude Code and type / to see the available commands".to_string(),
                "Use /specify to create a specification".to_string(),
                "Use /plan to create an implementation plan".to_string(),
                "Use /tasks to generate tasks".to_string(),
            ]),
            Agent::Gemini => steps.extend([
                "Run gemini /specify to create a specification".to_string(),
                "Run gemini /plan to create an implementation plan".to_string(),
                "See AGENTS.md for all available commands".to_string(),
            ]),
            Agent::Copilot => steps.push(
                "Open the project in Visual Studio Code and use /specify, /plan and /tasks with GitHub Copilot"
                    .to_string(),
            ),
            Agent::Codex => steps.extend([
                "Open the project with OpenAI Codex and use /specify, /plan and /tasks".to_string(),
                "See AGENTS.md for all available commands".to_string(),
                "Run specify feature create \"<description>\" when ready to start".to_string(),
            ]),
        }
        steps.push("Update memory/constitution.md with your project's non-negotiable principles".to_string());
        steps
    }
}

/// Initializes projects from the template cache
pub struct ProjectInitializer {
    cache: TemplateCache,
    source: Arc<dyn TemplateSource>,
    asset_name: String,
    progress: Option<Arc<ProgressFn>>,
}

impl ProjectInitializer {
    pub fn new(
        cache: TemplateCache,
        source: Arc<dyn TemplateSource>,
        asset_name: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            source,
            asset_name: asset_name.into(),
            progress: None,
        }
    }

    /// Report sync download progress to `progress`
    pub fn with_progress(mut self, progress: Arc<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Create the project. A directory created for a new project is
    /// removed again if the template steps fail.
    pub async fn initialize(
        &self,
        options: &InitOptions,
        git: &dyn GitOps,
    ) -> SpecifyResult<InitReport> {
        let path = options.target.path().to_path_buf();
        prepare_target(&options.target)?;
        info!("Initializing {} project at {}", options.agent, path.display());

        let outcome = self.populate(path.clone(), options.agent).await;
        let (resolution, documents) = match outcome {
            Ok(done) => done,
            Err(e) => {
                if let ProjectTarget::New(dir) = &options.target {
                    debug!("Removing partially initialized {}", dir.display());
                    if let Err(cleanup) = fs::remove_dir_all(dir) {
                        warn!("Failed to remove {}: {}", dir.display(), cleanup);
                    }
                }
                return Err(e);
            }
        };

        let git_outcome = if options.git {
            init_git(git, &path).await
        } else {
            GitOutcome::Skipped("disabled".to_string())
        };

        Ok(InitReport {
            name: options.target.name(),
            path,
            agent: options.agent,
            here: options.target.is_here(),
            placement: resolution.placement,
            synced: resolution.synced,
            documents,
            git: git_outcome,
        })
    }

    /// Templates and documents, on the blocking pool
    async fn populate(
        &self,
        path: PathBuf,
        agent: Agent,
    ) -> SpecifyResult<(crate::cache::Resolution, Vec<DocUpdate>)> {
        let cache = self.cache.clone();
        let source = Arc::clone(&self.source);
        let asset_name = self.asset_name.clone();
        let progress = self.progress.clone();

        tokio::task::spawn_blocking(move || {
            let mut resolver = TemplateResolver::new(&cache, source.as_ref(), asset_name);
            if let Some(progress) = progress {
                resolver = resolver.with_progress(progress);
            }
            let resolution = resolver.resolve(&path, agent)?;
            let documents = write_agent_documents(&path, agent, Some(&cache))?;

            if tree::is_dir_empty(&path)? {
                return Err(SpecifyError::PathInvalid {
                    path: path.clone(),
                    reason: "project directory is empty after initialization".to_string(),
                });
            }
            Ok((resolution, documents))
        })
        .await
        .map_err(|e| SpecifyError::Internal(format!("template task failed: {}", e)))?
    }
}

fn prepare_target(target: &ProjectTarget) -> SpecifyResult<()> {
    match target {
        ProjectTarget::New(path) => {
            if path.exists() {
                return Err(SpecifyError::ProjectExists(path.clone()));
            }
            tree::ensure_dir(path)
        }
        ProjectTarget::Here(path) => {
            if !path.is_dir() {
                return Err(SpecifyError::PathInvalid {
                    path: path.clone(),
                    reason: "not a directory".to_string(),
                });
            }
            let readonly = fs::metadata(path)
                .map(|m| m.permissions().readonly())
                .unwrap_or(false);
            if readonly {
                return Err(SpecifyError::AccessDenied(path.clone()));
            }
            Ok(())
        }
    }
}

async fn init_git(git: &dyn GitOps, path: &Path) -> GitOutcome {
    if !git.is_available().await {
        return GitOutcome::Skipped("git not found".to_string());
    }
    if git.is_repo(path).await {
        return GitOutcome::Existing;
    }
    match git.init_and_commit(path, INITIAL_COMMIT_MESSAGE).await {
        Ok(()) => GitOutcome::Initialized,
        Err(e) => {
            warn!("Git initialization failed: {}", e);
            GitOutcome::Failed(e.to_string())
        }
    }
}
