//! AGENTS.md and CLAUDE.md at the project root

use crate::agent::Agent;
use crate::cache::TemplateCache;
use crate::document::{self, MergeOutcome, NewDocument, Section};
use crate::error::{SpecifyError, SpecifyResult};
use crate::template::RenderContext;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const AGENTS_FILE: &str = "AGENTS.md";
pub const CLAUDE_FILE: &str = "CLAUDE.md";

/// Document template under the cache's `content/` directory
const AGENTS_TEMPLATE: &str = "agents-template.md";

const AGENTS_DOC: NewDocument<'static> = NewDocument {
    title: "Agent Instructions",
    intro: "This file contains instructions for AI agents working with the spec-kit project.",
};

const CLAUDE_DOC: NewDocument<'static> = NewDocument {
    title: "Claude Instructions",
    intro: "This file contains specific instructions for Claude Code.",
};

const CLAUDE_POINTER: &str = "you MUST follow the RULES in AGENTS.md";

/// A document written during initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocUpdate {
    pub path: PathBuf,
    pub outcome: MergeOutcome,
}

/// Merge the agent documents for `agent` into `project`
pub fn write_agent_documents(
    project: &Path,
    agent: Agent,
    cache: Option<&TemplateCache>,
) -> SpecifyResult<Vec<DocUpdate>> {
    let mut updates = vec![write_agents_md(project, agent, cache)?];
    if agent == Agent::Claude {
        updates.push(write_claude_md(project)?);
    }
    Ok(updates)
}

/// Create or update AGENTS.md
pub fn write_agents_md(
    project: &Path,
    agent: Agent,
    cache: Option<&TemplateCache>,
) -> SpecifyResult<DocUpdate> {
    let section = agents_section(agent, cache)?;
    merge_into(project, AGENTS_FILE, AGENTS_DOC, &section)
}

/// Create or update CLAUDE.md with a pointer to AGENTS.md
pub fn write_claude_md(project: &Path) -> SpecifyResult<DocUpdate> {
    merge_into(project, CLAUDE_FILE, CLAUDE_DOC, &Section::wrap(CLAUDE_POINTER))
}

/// The section from the cached agents template, rendered for `agent`, or
/// the built-in one
pub fn agents_section(agent: Agent, cache: Option<&TemplateCache>) -> SpecifyResult<Section> {
    let Some(path) = cache.and_then(|c| c.document_template(AGENTS_TEMPLATE)) else {
        return Ok(Section::wrap(&default_agents_body(agent)));
    };

    let text = fs::read_to_string(&path)
        .map_err(|e| SpecifyError::io(format!("reading {}", path.display()), e))?;
    let Some(section) = Section::extract(&text) else {
        debug!("{} has no delimited section, using built-in", path.display());
        return Ok(Section::wrap(&default_agents_body(agent)));
    };

    let rendered = RenderContext::new(agent)
        .render_str(section.as_str())
        .map_err(|reason| SpecifyError::TemplateRender {
            path: path.clone(),
            reason,
        })?;
    // Extracting again drops anything outside the markers that rendering added
    Section::extract(&rendered).ok_or_else(|| SpecifyError::TemplateRender {
        path,
        reason: "rendering removed the section markers".to_string(),
    })
}

fn merge_into(
    project: &Path,
    file: &str,
    fresh: NewDocument<'_>,
    section: &Section,
) -> SpecifyResult<DocUpdate> {
    if !project.is_dir() {
        return Err(SpecifyError::PathInvalid {
            path: project.to_path_buf(),
            reason: "project directory does not exist".to_string(),
        });
    }
    let path = project.join(file);
    let outcome = document::merge_file(&path, fresh, section)?;
    Ok(DocUpdate { path, outcome })
}

fn default_agents_body(agent: Agent) -> String {
    let folder = agent.folder();
    format!(
        r#"
## Specify Commands

Slash commands available in this spec-driven development environment. Each
command is documented in `{folder}/commands/<command>.md`.

### Built-in Commands

**`/specify`** - Create a feature specification and its branch from a description

**`/plan`** - Turn the specification into an implementation plan with research, data model, contracts and quickstart

**`/tasks`** - Break the plan into numbered, ordered tasks

### Command Flow

1. `/specify <description>` creates `spec.md` and the feature branch
2. `/plan` creates `plan.md`, `research.md`, `data-model.md`, `contracts/` and `quickstart.md`
3. `/tasks` creates `tasks.md`

New commands are added by dropping a Markdown file into `{folder}/commands/`.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_agents_md_with_builtin_section() {
        let temp = TempDir::new().unwrap();
        let update = write_agents_md(temp.path(), Agent::Gemini, None).unwrap();

        assert_eq!(update.outcome, MergeOutcome::Created);
        let text = fs::read_to_string(temp.path().join(AGENTS_FILE)).unwrap();
        assert!(text.starts_with("# Agent Instructions\n\n"));
        assert!(text.contains("`.gemini/commands/<command>.md`"));
        assert_eq!(text.matches("<specify>").count(), 1);
        assert!(text.ends_with("</specify>\n"));
    }

    #[test]
    fn updates_only_the_section() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(AGENTS_FILE);
        fs::write(&path, "# Mine\n\nKeep me.\n\n<specify>stale</specify>\n\nAnd me.\n").unwrap();

        let update = write_agents_md(temp.path(), Agent::Claude, None).unwrap();
        assert_eq!(update.outcome, MergeOutcome::Replaced);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Mine\n\nKeep me.\n\n<specify>\n## Specify Commands"));
        assert!(text.ends_with("</specify>\n\nAnd me.\n"));
        assert!(!text.contains("stale"));
    }

    #[test]
    fn cached_template_section_is_rendered() {
        let temp = TempDir::new().unwrap();
        let cache_root = temp.path().join("cache");
        fs::create_dir_all(cache_root.join("content")).unwrap();
        fs::write(
            cache_root.join("content/agents-template.md"),
            "# Heading\n\n<specify>Commands live in {{.AIAssistantFolder}}/commands</specify>\n",
        )
        .unwrap();
        let cache = TemplateCache::new(&cache_root);

        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        write_agents_md(&project, Agent::Codex, Some(&cache)).unwrap();

        let text = fs::read_to_string(project.join(AGENTS_FILE)).unwrap();
        assert!(text.contains("<specify>Commands live in .codex/commands</specify>"));
        assert!(!text.contains("# Heading"));
    }

    #[test]
    fn claude_gets_pointer_document() {
        let temp = TempDir::new().unwrap();
        let updates = write_agent_documents(temp.path(), Agent::Claude, None).unwrap();
        assert_eq!(updates.len(), 2);

        assert_eq!(
            fs::read_to_string(temp.path().join(CLAUDE_FILE)).unwrap(),
            "# Claude Instructions\n\nThis file contains specific instructions for Claude Code.\n\n<specify>you MUST follow the RULES in AGENTS.md</specify>\n"
        );
    }

    #[test]
    fn other_agents_skip_claude_md() {
        let temp = TempDir::new().unwrap();
        let updates = write_agent_documents(temp.path(), Agent::Copilot, None).unwrap();
        assert_eq!(updates.len(), 1);
        assert!(!temp.path().join(CLAUDE_FILE).exists());
    }

    #[test]
    fn claude_md_appends_to_existing_notes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CLAUDE_FILE);
        fs::write(&path, "# My rules\n").unwrap();

        let update = write_claude_md(temp.path()).unwrap();
        assert_eq!(update.outcome, MergeOutcome::Appended);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# My rules\n\n<specify>you MUST follow the RULES in AGENTS.md</specify>\n"
        );
    }

    #[test]
    fn missing_project_is_rejected() {
        let temp = TempDir::new().unwrap();
        let err = write_claude_md(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, SpecifyError::PathInvalid { .. }));
    }
}
