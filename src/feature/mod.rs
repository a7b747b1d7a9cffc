//! Feature workflow inside a spec-driven repository
//!
//! A feature lives on a branch named `NNN-short-name` and in
//! `specs/NNN-short-name/`, which collects `spec.md`, `plan.md` and the
//! design documents produced from them.

pub mod context;

use crate::agent::Agent;
use crate::error::{SpecifyError, SpecifyResult};
use crate::git::GitOps;
use chrono::NaiveDate;
use context::{TechInfo, BASIC_AGENT_TEMPLATE};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

pub const SPECS_DIR: &str = "specs";
pub const SPEC_FILE: &str = "spec.md";
pub const PLAN_FILE: &str = "plan.md";
pub const TASKS_FILE: &str = "tasks.md";

const SPEC_TEMPLATE: &str = "spec-template.md";
const PLAN_TEMPLATE: &str = "plan-template.md";
const AGENT_FILE_TEMPLATE: &str = "agent-file-template.md";
const SPEC_STUB: &str = "# Feature Specification\n\nTODO: Add feature specification\n";

/// Optional design documents reported by `check`
const OPTIONAL_DOCS: [&str; 3] = ["research.md", "data-model.md", "quickstart.md"];
const CONTRACTS_DIR: &str = "contracts";

/// Words from the description kept in the branch name
const BRANCH_WORDS: usize = 3;

/// Result of `feature create`
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCreated {
    pub branch_name: String,
    pub spec_file: PathBuf,
    pub feature_num: String,
}

/// Result of `feature plan`
#[derive(Debug, Clone, Serialize)]
pub struct FeaturePlan {
    pub feature_spec: PathBuf,
    pub impl_plan: PathBuf,
    pub specs_dir: PathBuf,
    pub branch: String,
}

/// Result of `feature check`
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCheck {
    pub feature_dir: PathBuf,
    pub available_docs: Vec<String>,
}

/// An agent context file touched by `feature context`
#[derive(Debug, Clone, Serialize)]
pub struct AgentUpdate {
    pub agent: String,
    #[serde(skip_serializing)]
    pub path: PathBuf,
    #[serde(skip_serializing)]
    pub created: bool,
}

/// Result of `feature context`
#[derive(Debug, Clone, Serialize)]
pub struct ContextUpdate {
    pub branch: String,
    pub updates: Vec<AgentUpdate>,
    pub summary: Vec<String>,
}

/// Result of `feature paths`
#[derive(Debug, Clone, Serialize)]
pub struct FeaturePaths {
    pub repo_root: PathBuf,
    pub branch: String,
    pub feature_dir: PathBuf,
    pub feature_spec: PathBuf,
    pub impl_plan: PathBuf,
    pub tasks: PathBuf,
}

/// Feature operations for the repository containing `cwd`
pub struct FeatureService<'a> {
    git: &'a dyn GitOps,
    cwd: PathBuf,
}

impl<'a> FeatureService<'a> {
    pub fn new(git: &'a dyn GitOps, cwd: impl Into<PathBuf>) -> Self {
        Self {
            git,
            cwd: cwd.into(),
        }
    }

    /// Number the feature, create its branch and seed `spec.md`
    pub async fn create(&self, description: &str) -> SpecifyResult<FeatureCreated> {
        let slug = branch_slug(description).ok_or_else(|| {
            SpecifyError::User(
                "Feature description must contain at least one letter or digit".to_string(),
            )
        })?;

        let root = self.repo_root().await?;
        let specs = root.join(SPECS_DIR);
        fs::create_dir_all(&specs)
            .await
            .map_err(|e| SpecifyError::io(format!("creating {}", specs.display()), e))?;

        let feature_num = format!("{:03}", next_feature_number(&specs).await?);
        let branch_name = format!("{}-{}", feature_num, slug);

        self.git.create_branch(&root, &branch_name).await?;
        info!("Switched to branch {}", branch_name);

        let feature_dir = specs.join(&branch_name);
        fs::create_dir_all(&feature_dir)
            .await
            .map_err(|e| SpecifyError::io(format!("creating {}", feature_dir.display()), e))?;

        let spec_file = feature_dir.join(SPEC_FILE);
        let content = match find_template(&root, SPEC_TEMPLATE) {
            Some(template) => read(&template).await?,
            None => {
                debug!("No {} found, writing stub", SPEC_TEMPLATE);
                SPEC_STUB.to_string()
            }
        };
        write(&spec_file, &content).await?;

        Ok(FeatureCreated {
            branch_name,
            spec_file,
            feature_num,
        })
    }

    /// Seed `plan.md` from the agent's plan template
    pub async fn plan(&self) -> SpecifyResult<FeaturePlan> {
        let root = self.repo_root().await?;
        let branch = self.feature_branch(&root).await?;
        let agent = detect_agent(&root).ok_or(SpecifyError::AgentNotDetected)?;

        let specs_dir = feature_dir(&root, &branch);
        fs::create_dir_all(&specs_dir)
            .await
            .map_err(|e| SpecifyError::io(format!("creating {}", specs_dir.display()), e))?;

        let impl_plan = specs_dir.join(PLAN_FILE);
        let template = root.join(agent.folder()).join("templates").join(PLAN_TEMPLATE);

        if impl_plan.exists() {
            info!("{} already exists, leaving it in place", impl_plan.display());
        } else if template.is_file() {
            let text = read(&template).await?;
            let text = text.replace("$SPECS_DIR", &specs_dir.to_string_lossy());
            write(&impl_plan, &text).await?;
        } else {
            warn!("Plan template not found at {}", template.display());
            write(&impl_plan, "").await?;
        }

        Ok(FeaturePlan {
            feature_spec: specs_dir.join(SPEC_FILE),
            impl_plan,
            specs_dir,
            branch,
        })
    }

    /// Confirm the plan exists and list the design documents alongside it
    pub async fn check(&self) -> SpecifyResult<FeatureCheck> {
        let root = self.repo_root().await?;
        let branch = self.feature_branch(&root).await?;
        let feature_dir = feature_dir(&root, &branch);

        if !feature_dir.is_dir() {
            return Err(SpecifyError::User(format!(
                "Feature directory not found: {}. Run: specify feature create first",
                feature_dir.display()
            )));
        }
        if !feature_dir.join(PLAN_FILE).is_file() {
            return Err(SpecifyError::User(format!(
                "{} not found in {}. Run: specify feature plan first",
                PLAN_FILE,
                feature_dir.display()
            )));
        }

        let mut available_docs: Vec<String> = OPTIONAL_DOCS
            .iter()
            .filter(|doc| feature_dir.join(doc).is_file())
            .map(|doc| doc.to_string())
            .collect();
        if has_entries(&feature_dir.join(CONTRACTS_DIR)).await {
            available_docs.push(format!("{}/", CONTRACTS_DIR));
        }

        Ok(FeatureCheck {
            feature_dir,
            available_docs,
        })
    }

    /// Fold the plan's technology choices into agent context files.
    ///
    /// With `agent`, only that agent's file is written. Otherwise every
    /// existing context file is updated, and Claude's is created when
    /// there are none.
    pub async fn context(
        &self,
        agent: Option<Agent>,
        today: NaiveDate,
    ) -> SpecifyResult<ContextUpdate> {
        let root = self.repo_root().await?;
        let branch = self.feature_branch(&root).await?;

        let plan_path = feature_dir(&root, &branch).join(PLAN_FILE);
        if !plan_path.is_file() {
            return Err(SpecifyError::PathNotFound(plan_path));
        }
        let tech = TechInfo::extract(&read(&plan_path).await?)?;

        let targets = match agent {
            Some(agent) => {
                let file = agent.context_file().ok_or_else(|| {
                    SpecifyError::User(format!(
                        "{} has no context file to update",
                        agent.display_name()
                    ))
                })?;
                vec![(agent, file)]
            }
            None => {
                let existing: Vec<_> = Agent::ALL
                    .into_iter()
                    .filter_map(|a| a.context_file().map(|f| (a, f)))
                    .filter(|(_, f)| root.join(f).is_file())
                    .collect();
                if existing.is_empty() {
                    vec![(Agent::Claude, "CLAUDE.md")]
                } else {
                    existing
                }
            }
        };

        let mut updates = Vec::with_capacity(targets.len());
        for (agent, file) in targets {
            let path = root.join(file);
            let created = !path.is_file();
            let content = if created {
                let template = match root.join("templates").join(AGENT_FILE_TEMPLATE) {
                    t if t.is_file() => read(&t).await?,
                    _ => BASIC_AGENT_TEMPLATE.to_string(),
                };
                context::render_new(&template, &project_name(&root), today, &tech, &branch)
            } else {
                context::update_existing(&read(&path).await?, &tech, &branch, today)?
            };

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| SpecifyError::io(format!("creating {}", parent.display()), e))?;
            }
            write(&path, &content).await?;
            debug!(
                "{} {}",
                if created { "Created" } else { "Updated" },
                path.display()
            );

            updates.push(AgentUpdate {
                agent: agent.display_name().to_string(),
                path,
                created,
            });
        }

        Ok(ContextUpdate {
            branch,
            updates,
            summary: tech.summary(),
        })
    }

    /// Paths of the current feature's documents
    pub async fn paths(&self) -> SpecifyResult<FeaturePaths> {
        let repo_root = self.repo_root().await?;
        let branch = self.git.current_branch(&repo_root).await?;
        let feature_dir = feature_dir(&repo_root, &branch);

        Ok(FeaturePaths {
            feature_spec: feature_dir.join(SPEC_FILE),
            impl_plan: feature_dir.join(PLAN_FILE),
            tasks: feature_dir.join(TASKS_FILE),
            feature_dir,
            branch,
            repo_root,
        })
    }

    async fn repo_root(&self) -> SpecifyResult<PathBuf> {
        self.git.repo_root(&self.cwd).await.map_err(|e| {
            debug!("repo root lookup failed: {}", e);
            SpecifyError::User(format!(
                "{} is not inside a git repository",
                self.cwd.display()
            ))
        })
    }

    async fn feature_branch(&self, root: &Path) -> SpecifyResult<String> {
        let branch = self.git.current_branch(root).await?;
        if is_feature_branch(&branch) {
            Ok(branch)
        } else {
            Err(SpecifyError::NotFeatureBranch(branch))
        }
    }
}

/// `specs/<branch>` under `root`
pub fn feature_dir(root: &Path, branch: &str) -> PathBuf {
    root.join(SPECS_DIR).join(branch)
}

/// Three digits and a dash, e.g. `004-user-auth`
pub fn is_feature_branch(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b'-'
}

/// Lowercased first words of `description` joined by `-`
pub fn branch_slug(description: &str) -> Option<String> {
    let lowered = description.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(BRANCH_WORDS)
        .collect();
    (!words.is_empty()).then(|| words.join("-"))
}

/// One past the highest three-digit prefix in `specs`
pub async fn next_feature_number(specs: &Path) -> SpecifyResult<u32> {
    let mut entries = match fs::read_dir(specs).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(1),
        Err(e) => return Err(SpecifyError::io(format!("reading {}", specs.display()), e)),
    };

    let mut highest = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SpecifyError::io(format!("reading {}", specs.display()), e))?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let prefix = name.get(..3).filter(|p| p.bytes().all(|b| b.is_ascii_digit()));
        if let Some(number) = prefix.and_then(|p| p.parse::<u32>().ok()) {
            highest = highest.max(number);
        }
    }
    Ok(highest + 1)
}

/// First agent folder present at `root`, probing in [`Agent::ALL`] order
pub fn detect_agent(root: &Path) -> Option<Agent> {
    Agent::ALL
        .into_iter()
        .find(|agent| root.join(agent.folder()).is_dir())
}

/// `templates/<name>` at the root, else the detected agent's copy
fn find_template(root: &Path, name: &str) -> Option<PathBuf> {
    let shared = root.join("templates").join(name);
    if shared.is_file() {
        return Some(shared);
    }
    let agent = detect_agent(root)?;
    let scoped = root.join(agent.folder()).join("templates").join(name);
    scoped.is_file().then_some(scoped)
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

async fn has_entries(dir: &Path) -> bool {
    match fs::read_dir(dir).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
        Err(_) => false,
    }
}

async fn read(path: &Path) -> SpecifyResult<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| SpecifyError::io(format!("reading {}", path.display()), e))
}

async fn write(path: &Path, content: &str) -> SpecifyResult<()> {
    fs::write(path, content)
        .await
        .map_err(|e| SpecifyError::io(format!("writing {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGit;
    use std::fs as stdfs;
    use tempfile::TempDir;

    const PLAN: &str = "**Language/Version**: Go 1.22\n**Primary Dependencies**: cobra\n**Storage**: SQLite\n**Project Type**: web\n";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn setup(branch: &str) -> (TempDir, FakeGit) {
        let temp = TempDir::new().unwrap();
        let git = FakeGit::repo(temp.path(), branch);
        (temp, git)
    }

    fn write_plan(root: &Path, branch: &str) {
        let dir = feature_dir(root, branch);
        stdfs::create_dir_all(&dir).unwrap();
        stdfs::write(dir.join(PLAN_FILE), PLAN).unwrap();
    }

    #[test]
    fn slug_keeps_first_three_words() {
        assert_eq!(
            branch_slug("Add User Authentication with OAuth").as_deref(),
            Some("add-user-authentication")
        );
        assert_eq!(branch_slug("  fix: the  bug!! ").as_deref(), Some("fix-the-bug"));
        assert_eq!(branch_slug("Über café"), Some("ber-caf".to_string()));
        assert_eq!(branch_slug("!!! ..."), None);
    }

    #[test]
    fn feature_branch_names() {
        assert!(is_feature_branch("001-login"));
        assert!(is_feature_branch("123-"));
        assert!(!is_feature_branch("main"));
        assert!(!is_feature_branch("12-x"));
        assert!(!is_feature_branch("0012-x"));
    }

    #[tokio::test]
    async fn numbering_uses_highest_prefix() {
        let temp = TempDir::new().unwrap();
        assert_eq!(next_feature_number(&temp.path().join("none")).await.unwrap(), 1);

        for name in ["001-a", "007-b", "notes", "12x"] {
            stdfs::create_dir_all(temp.path().join(name)).unwrap();
        }
        assert_eq!(next_feature_number(temp.path()).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn create_numbers_branch_and_writes_spec() {
        let (temp, git) = setup("main");
        stdfs::create_dir_all(temp.path().join("specs/002-old")).unwrap();

        let service = FeatureService::new(&git, temp.path());
        let created = service.create("Photo albums by date").await.unwrap();

        assert_eq!(created.feature_num, "003");
        assert_eq!(created.branch_name, "003-photo-albums-by");
        assert_eq!(git.branch(), "003-photo-albums-by");
        assert_eq!(
            stdfs::read_to_string(&created.spec_file).unwrap(),
            SPEC_STUB
        );
    }

    #[tokio::test]
    async fn create_prefers_spec_template() {
        let (temp, git) = setup("main");
        stdfs::create_dir_all(temp.path().join(".gemini/templates")).unwrap();
        stdfs::write(
            temp.path().join(".gemini/templates/spec-template.md"),
            "# Spec for [FEATURE]\n",
        )
        .unwrap();

        let created = FeatureService::new(&git, temp.path())
            .create("search")
            .await
            .unwrap();
        assert_eq!(created.branch_name, "001-search");
        assert_eq!(
            stdfs::read_to_string(&created.spec_file).unwrap(),
            "# Spec for [FEATURE]\n"
        );
    }

    #[tokio::test]
    async fn create_outside_repo_fails() {
        let temp = TempDir::new().unwrap();
        let git = FakeGit::no_repo();
        let err = FeatureService::new(&git, temp.path())
            .create("x")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not inside a git repository"));
    }

    #[tokio::test]
    async fn plan_copies_agent_template() {
        let (temp, git) = setup("001-search");
        let templates = temp.path().join(".codex/templates");
        stdfs::create_dir_all(&templates).unwrap();
        stdfs::write(templates.join(PLAN_TEMPLATE), "Docs in $SPECS_DIR\n").unwrap();

        let plan = FeatureService::new(&git, temp.path()).plan().await.unwrap();
        let expected_dir = temp.path().join("specs/001-search");
        assert_eq!(plan.specs_dir, expected_dir);
        assert_eq!(plan.branch, "001-search");
        assert_eq!(
            stdfs::read_to_string(&plan.impl_plan).unwrap(),
            format!("Docs in {}\n", expected_dir.display())
        );
    }

    #[tokio::test]
    async fn plan_requires_feature_branch_and_agent() {
        let (temp, git) = setup("main");
        let err = FeatureService::new(&git, temp.path()).plan().await.unwrap_err();
        assert!(matches!(err, SpecifyError::NotFeatureBranch(ref b) if b == "main"));

        let (temp, git) = setup("001-x");
        let err = FeatureService::new(&git, temp.path()).plan().await.unwrap_err();
        assert!(matches!(err, SpecifyError::AgentNotDetected));
    }

    #[tokio::test]
    async fn check_lists_available_docs() {
        let (temp, git) = setup("002-api");
        let service = FeatureService::new(&git, temp.path());
        assert!(service.check().await.is_err());

        write_plan(temp.path(), "002-api");
        let dir = feature_dir(temp.path(), "002-api");
        stdfs::write(dir.join("research.md"), "r").unwrap();
        stdfs::create_dir_all(dir.join("contracts")).unwrap();

        let check = service.check().await.unwrap();
        assert_eq!(check.available_docs, vec!["research.md"]);

        stdfs::write(dir.join("contracts/api.yaml"), "openapi: 3").unwrap();
        stdfs::write(dir.join("quickstart.md"), "q").unwrap();
        let check = service.check().await.unwrap();
        assert_eq!(check.available_docs, vec!["research.md", "quickstart.md", "contracts/"]);
    }

    #[tokio::test]
    async fn context_creates_claude_file_when_none_exist() {
        let (temp, git) = setup("004-sync");
        write_plan(temp.path(), "004-sync");

        let update = FeatureService::new(&git, temp.path())
            .context(None, today())
            .await
            .unwrap();

        assert_eq!(update.updates.len(), 1);
        assert_eq!(update.updates[0].agent, "Claude Code");
        assert!(update.updates[0].created);
        let text = stdfs::read_to_string(temp.path().join("CLAUDE.md")).unwrap();
        assert!(text.contains("Last updated: 2025-06-01"));
        assert!(text.contains("- Go 1.22 + cobra (004-sync)"));
        assert!(text.contains("backend/\nfrontend/\ntests/"));
        assert_eq!(
            update.summary,
            vec!["Added language: Go 1.22", "Added framework: cobra", "Added database: SQLite"]
        );
    }

    #[tokio::test]
    async fn context_updates_every_existing_file() {
        let (temp, git) = setup("005-feed");
        write_plan(temp.path(), "005-feed");
        let existing = "Last updated: 2024-01-01\n\n## Active Technologies\n- Python (001-a)\n\n## Recent Changes\n- 001-a: Added Python\n";
        stdfs::write(temp.path().join("GEMINI.md"), existing).unwrap();
        stdfs::create_dir_all(temp.path().join(".github")).unwrap();
        stdfs::write(temp.path().join(".github/copilot-instructions.md"), existing).unwrap();

        let update = FeatureService::new(&git, temp.path())
            .context(None, today())
            .await
            .unwrap();

        let agents: Vec<_> = update.updates.iter().map(|u| u.agent.as_str()).collect();
        assert_eq!(agents, vec!["Gemini CLI", "GitHub Copilot"]);
        assert!(!temp.path().join("CLAUDE.md").exists());
        let text = stdfs::read_to_string(temp.path().join("GEMINI.md")).unwrap();
        assert!(text.contains("- Python (001-a)\n- Go 1.22 + cobra (005-feed)\n"));
        assert!(text.contains("## Recent Changes\n- 005-feed: Added Go 1.22 + cobra\n- 001-a: Added Python"));
    }

    #[tokio::test]
    async fn context_for_named_agent_creates_nested_file() {
        let (temp, git) = setup("006-x");
        write_plan(temp.path(), "006-x");

        let service = FeatureService::new(&git, temp.path());
        let update = service.context(Some(Agent::Copilot), today()).await.unwrap();
        assert!(update.updates[0].path.ends_with(".github/copilot-instructions.md"));
        assert!(update.updates[0].path.is_file());

        let err = service.context(Some(Agent::Codex), today()).await.unwrap_err();
        assert!(err.to_string().contains("no context file"));
    }

    #[tokio::test]
    async fn paths_follow_branch() {
        let (temp, git) = setup("009-report");
        let paths = FeatureService::new(&git, temp.path()).paths().await.unwrap();
        assert_eq!(paths.repo_root, temp.path());
        assert_eq!(paths.feature_dir, temp.path().join("specs/009-report"));
        assert_eq!(paths.tasks, temp.path().join("specs/009-report/tasks.md"));

        let json = serde_json::to_value(&paths).unwrap();
        assert_eq!(json["branch"], "009-report");
        assert!(json.get("impl_plan").is_some());
    }
}
