//! Agent context files generated from a feature's plan
//!
//! Technology facts are pulled out of `plan.md` by label
//! (`**Language/Version**: ...`) and folded into the agent's context file:
//! a new file from the agent file template, or an in-place update of the
//! `## Active Technologies` and `## Recent Changes` sections.

use crate::error::{SpecifyError, SpecifyResult};
use chrono::NaiveDate;
use regex::{Captures, Regex};

const UNRESOLVED: &str = "NEEDS CLARIFICATION";

/// Entries kept under `## Recent Changes`
const RECENT_CHANGES_KEPT: usize = 3;

/// Test and lint commands per language, first match wins
const LANGUAGE_COMMANDS: [(&str, &str); 5] = [
    ("Python", "cd src && pytest && ruff check ."),
    ("Rust", "cargo test && cargo clippy"),
    ("JavaScript", "npm test && npm run lint"),
    ("TypeScript", "npm test && npm run lint"),
    ("Go", "go test ./... && golangci-lint run"),
];

/// Used when the project has no `templates/agent-file-template.md`
pub const BASIC_AGENT_TEMPLATE: &str = "# [PROJECT NAME]

Last updated: [DATE]

## Active Technologies
[EXTRACTED FROM ALL PLAN.MD FILES]

## Project Structure
```
[ACTUAL STRUCTURE FROM PLANS]
```

## Commands
```bash
[ONLY COMMANDS FOR ACTIVE TECHNOLOGIES]
```

## Code Style
[LANGUAGE-SPECIFIC, ONLY FOR LANGUAGES IN USE]

## Recent Changes
[LAST 3 FEATURES AND WHAT THEY ADDED]
";

/// Technology choices recorded in a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechInfo {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub testing: Option<String>,
    pub database: Option<String>,
    pub project_type: Option<String>,
}

impl TechInfo {
    /// Pull the labelled fields out of plan text
    pub fn extract(plan: &str) -> SpecifyResult<Self> {
        let resolved = |value: Option<String>| value.filter(|v| !v.contains(UNRESOLVED));

        Ok(Self {
            language: resolved(field(plan, "Language/Version")?),
            framework: resolved(field(plan, "Primary Dependencies")?),
            testing: resolved(field(plan, "Testing")?),
            database: resolved(field(plan, "Storage")?).filter(|v| !v.contains("N/A")),
            project_type: field(plan, "Project Type")?,
        })
    }

    /// `- Rust 1.82 + tokio (001-feature)`, if the language is known
    pub fn tech_line(&self, branch: &str) -> Option<String> {
        let language = self.language.as_deref()?;
        Some(match self.framework.as_deref() {
            Some(framework) => format!("- {} + {} ({})", language, framework, branch),
            None => format!("- {} ({})", language, branch),
        })
    }

    /// `- 001-feature: Added Rust 1.82 + tokio`, if the language is known
    pub fn change_line(&self, branch: &str) -> Option<String> {
        let language = self.language.as_deref()?;
        Some(match self.framework.as_deref() {
            Some(framework) => format!("- {}: Added {} + {}", branch, language, framework),
            None => format!("- {}: Added {}", branch, language),
        })
    }

    /// Human-readable list of what was recorded
    pub fn summary(&self) -> Vec<String> {
        let mut summary = Vec::new();
        if let Some(language) = &self.language {
            summary.push(format!("Added language: {}", language));
        }
        if let Some(framework) = &self.framework {
            summary.push(format!("Added framework: {}", framework));
        }
        if let Some(database) = &self.database {
            summary.push(format!("Added database: {}", database));
        }
        summary
    }
}

/// Fill a fresh agent file from `template`
pub fn render_new(
    template: &str,
    project_name: &str,
    date: NaiveDate,
    tech: &TechInfo,
    branch: &str,
) -> String {
    let mut content = template
        .replace("[PROJECT NAME]", project_name)
        .replace("[DATE]", &date.format("%Y-%m-%d").to_string());

    if tech.framework.is_some() {
        if let Some(line) = tech.tech_line(branch) {
            content = content.replace("[EXTRACTED FROM ALL PLAN.MD FILES]", &line);
        }
        if let Some(line) = tech.change_line(branch) {
            content = content.replace("[LAST 3 FEATURES AND WHAT THEY ADDED]", &line);
        }
    }

    let structure = if tech.project_type.as_deref().unwrap_or_default().contains("web") {
        "backend/\nfrontend/\ntests/"
    } else {
        "src/\ntests/"
    };
    content = content.replace("[ACTUAL STRUCTURE FROM PLANS]", structure);

    let language = tech.language.as_deref().unwrap_or_default();
    content = content.replace(
        "[ONLY COMMANDS FOR ACTIVE TECHNOLOGIES]",
        &commands_for_language(language),
    );
    if !language.is_empty() {
        content = content.replace(
            "[LANGUAGE-SPECIFIC, ONLY FOR LANGUAGES IN USE]",
            &format!("{}: Follow standard conventions", language),
        );
    }
    content
}

/// Fold `tech` into an existing agent file.
///
/// The technology line is added once; the change entry goes first in
/// `## Recent Changes`, which keeps the newest three. `Last updated:` is
/// refreshed either way.
pub fn update_existing(
    content: &str,
    tech: &TechInfo,
    branch: &str,
    date: NaiveDate,
) -> SpecifyResult<String> {
    let mut content = content.to_string();

    if let (Some(tech_line), Some(change_line)) = (tech.tech_line(branch), tech.change_line(branch)) {
        if !content.contains(&tech_line) {
            content = section_regex("Active Technologies")?
                .replacen(&content, 1, |caps: &Captures| {
                    let body = &caps[2];
                    if body.trim().is_empty() {
                        format!("{}{}{}", &caps[1], tech_line, &caps[3])
                    } else {
                        format!("{}{}\n{}{}", &caps[1], body, tech_line, &caps[3])
                    }
                })
                .into_owned();
        }

        content = section_regex("Recent Changes")?
            .replacen(&content, 1, |caps: &Captures| {
                let mut changes = vec![change_line.clone()];
                changes.extend(
                    caps[2]
                        .lines()
                        .map(str::trim_end)
                        .filter(|line| !line.trim().is_empty() && *line != change_line)
                        .map(String::from),
                );
                changes.truncate(RECENT_CHANGES_KEPT);
                format!("{}{}{}", &caps[1], changes.join("\n"), &caps[3])
            })
            .into_owned();
    }

    let today = format!("Last updated: {}", date.format("%Y-%m-%d"));
    Ok(date_regex()?.replace_all(&content, today.as_str()).into_owned())
}

fn commands_for_language(language: &str) -> String {
    LANGUAGE_COMMANDS
        .iter()
        .find(|(name, _)| language.contains(name))
        .map(|(_, commands)| commands.to_string())
        .unwrap_or_else(|| format!("# Add commands for {}", language))
}

/// Trimmed value after `**label**: ` on the first matching line
fn field(text: &str, label: &str) -> SpecifyResult<Option<String>> {
    let re = compile(&format!(r"\*\*{}\*\*: (.+)", regex::escape(label)))?;
    Ok(re
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Header line, section body, and the blank line (or end of text) closing it
fn section_regex(heading: &str) -> SpecifyResult<Regex> {
    compile(&format!(
        r"(?s)(## {}\n)(.*?)(\n\n|\n?\z)",
        regex::escape(heading)
    ))
}

fn date_regex() -> SpecifyResult<Regex> {
    compile(r"Last updated: \d{4}-\d{2}-\d{2}")
}

fn compile(pattern: &str) -> SpecifyResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| SpecifyError::Internal(format!("invalid pattern {}: {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = "# Implementation Plan

**Language/Version**: Rust 1.82
**Primary Dependencies**: tokio, clap
**Storage**: N/A
**Testing**: cargo test
**Project Type**: single
";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn extracts_plan_fields() {
        let tech = TechInfo::extract(PLAN).unwrap();
        assert_eq!(tech.language.as_deref(), Some("Rust 1.82"));
        assert_eq!(tech.framework.as_deref(), Some("tokio, clap"));
        assert_eq!(tech.testing.as_deref(), Some("cargo test"));
        assert_eq!(tech.database, None);
        assert_eq!(tech.project_type.as_deref(), Some("single"));
    }

    #[test]
    fn unresolved_values_are_ignored() {
        let plan = "**Language/Version**: NEEDS CLARIFICATION\n**Storage**: PostgreSQL 16\n";
        let tech = TechInfo::extract(plan).unwrap();
        assert_eq!(tech.language, None);
        assert_eq!(tech.database.as_deref(), Some("PostgreSQL 16"));
        assert_eq!(tech.tech_line("001-x"), None);
    }

    #[test]
    fn renders_basic_template() {
        let tech = TechInfo::extract(PLAN).unwrap();
        let out = render_new(BASIC_AGENT_TEMPLATE, "demo", date(), &tech, "001-cli");

        assert!(out.starts_with("# demo\n\nLast updated: 2025-03-14\n"));
        assert!(out.contains("## Active Technologies\n- Rust 1.82 + tokio, clap (001-cli)\n"));
        assert!(out.contains("src/\ntests/"));
        assert!(out.contains("cargo test && cargo clippy"));
        assert!(out.contains("Rust 1.82: Follow standard conventions"));
        assert!(out.contains("## Recent Changes\n- 001-cli: Added Rust 1.82 + tokio, clap\n"));
    }

    #[test]
    fn web_projects_get_split_structure() {
        let tech = TechInfo {
            language: Some("TypeScript 5".into()),
            project_type: Some("web application".into()),
            ..Default::default()
        };
        let out = render_new(BASIC_AGENT_TEMPLATE, "site", date(), &tech, "002-ui");
        assert!(out.contains("backend/\nfrontend/\ntests/"));
        assert!(out.contains("npm test && npm run lint"));
    }

    #[test]
    fn unknown_language_gets_placeholder_command() {
        assert_eq!(commands_for_language("Zig 0.13"), "# Add commands for Zig 0.13");
        assert_eq!(commands_for_language("Go 1.22"), "go test ./... && golangci-lint run");
    }

    #[test]
    fn updates_sections_and_date() {
        let existing = "# demo

Last updated: 2024-01-01

## Active Technologies
- Python 3.12 + FastAPI (001-api)

## Recent Changes
- 003-c: Added C
- 002-b: Added B
- 001-a: Added A

## Notes
keep me
";
        let tech = TechInfo::extract(PLAN).unwrap();
        let out = update_existing(existing, &tech, "004-cli", date()).unwrap();

        assert!(out.contains("Last updated: 2025-03-14"));
        assert!(out.contains(
            "## Active Technologies\n- Python 3.12 + FastAPI (001-api)\n- Rust 1.82 + tokio, clap (004-cli)\n\n"
        ));
        assert!(out.contains(
            "## Recent Changes\n- 004-cli: Added Rust 1.82 + tokio, clap\n- 003-c: Added C\n- 002-b: Added B\n\n"
        ));
        assert!(!out.contains("001-a: Added A"));
        assert!(out.ends_with("## Notes\nkeep me\n"));
    }

    #[test]
    fn update_is_stable_when_repeated() {
        let existing = "## Active Technologies\n- Go (001-a)\n\n## Recent Changes\n- 001-a: Added Go\n";
        let tech = TechInfo::extract(PLAN).unwrap();
        let once = update_existing(existing, &tech, "002-b", date()).unwrap();
        let twice = update_existing(&once, &tech, "002-b", date()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.matches("(002-b)").count(), 1);
        assert!(once.ends_with("## Recent Changes\n- 002-b: Added Rust 1.82 + tokio, clap\n- 001-a: Added Go\n"));
    }

    #[test]
    fn without_language_only_date_changes() {
        let existing = "Last updated: 2020-02-02\n## Active Technologies\n- Go (001-a)\n\n";
        let out = update_existing(existing, &TechInfo::default(), "002-b", date()).unwrap();
        assert_eq!(out, "Last updated: 2025-03-14\n## Active Technologies\n- Go (001-a)\n\n");
    }
}
