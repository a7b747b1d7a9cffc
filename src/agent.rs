//! Supported AI assistants
//!
//! Each agent owns a hidden folder at the project root (`.claude`,
//! `.gemini`, ...) that receives its command and template files.

use crate::error::SpecifyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An AI assistant a project can be initialized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Claude,
    Gemini,
    Copilot,
    Codex,
}

impl Agent {
    /// All agents, in the order folders are probed when detecting a project's agent
    pub const ALL: [Agent; 4] = [Agent::Claude, Agent::Codex, Agent::Gemini, Agent::Copilot];

    /// Identifier used on the command line and in folder names
    pub fn id(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Copilot => "copilot",
            Self::Codex => "codex",
        }
    }

    /// Human-readable product name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude Code",
            Self::Gemini => "Gemini CLI",
            Self::Copilot => "GitHub Copilot",
            Self::Codex => "OpenAI Codex",
        }
    }

    /// Hidden folder name, e.g. `.claude`
    pub fn folder(&self) -> String {
        format!(".{}", self.id())
    }

    /// Executable that must be on PATH for the agent to be usable, if any
    pub fn cli_tool(&self) -> Option<&'static str> {
        match self {
            Self::Claude => Some("claude"),
            Self::Gemini => Some("gemini"),
            Self::Copilot | Self::Codex => None,
        }
    }

    /// Where to get the agent's CLI
    pub fn install_hint(&self) -> &'static str {
        match self {
            Self::Claude => "https://docs.anthropic.com/en/docs/claude-code/setup",
            Self::Gemini => "https://github.com/google-gemini/gemini-cli",
            Self::Copilot => "https://code.visualstudio.com/",
            Self::Codex => "https://github.com/openai/codex",
        }
    }

    /// Project-relative path of the agent's context document, if it has one
    pub fn context_file(&self) -> Option<&'static str> {
        match self {
            Self::Claude => Some("CLAUDE.md"),
            Self::Gemini => Some("GEMINI.md"),
            Self::Copilot => Some(".github/copilot-instructions.md"),
            Self::Codex => None,
        }
    }

    /// Match a hidden folder name (`.gemini`) back to its agent
    pub fn from_folder(name: &str) -> Option<Agent> {
        let id = name.strip_prefix('.')?;
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Sorted, comma-separated list of identifiers for messages
    pub fn valid_ids() -> String {
        let mut ids: Vec<&str> = Self::ALL.iter().map(|a| a.id()).collect();
        ids.sort_unstable();
        ids.join(", ")
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Agent {
    type Err = SpecifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.id() == wanted)
            .ok_or_else(|| SpecifyError::InvalidAgent {
                name: s.to_string(),
                valid: Self::valid_ids(),
            })
    }
}
