//! CLI argument definitions using clap derive

use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Specify - spec-driven project scaffolding
///
/// Sets up projects from the spec-kit templates for your AI assistant and
/// drives the feature workflow (spec, plan, tasks).
#[derive(Parser, Debug)]
#[command(name = "specify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SPECIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Template cache directory (overrides templates.cache_dir)
    #[arg(long, global = true, env = "SPECIFY_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project from the templates
    Init(InitArgs),

    /// Manage the local template cache
    Templates(TemplatesArgs),

    /// Feature workflow: create, plan, check, context, paths
    Feature(FeatureArgs),

    /// Check tools, connectivity and the template cache
    Check,

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Arguments for the init command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["name", "here"])))]
pub struct InitArgs {
    /// Name of the new project directory
    pub name: Option<String>,

    /// Initialize in the current directory
    #[arg(long)]
    pub here: bool,

    /// AI assistant: claude, gemini, copilot or codex
    #[arg(long, value_name = "AGENT")]
    pub ai: Option<String>,

    /// Skip git repository initialization
    #[arg(long)]
    pub no_git: bool,

    /// Do not ask before initializing into a non-empty directory
    #[arg(short, long)]
    pub force: bool,

    /// Skip the check for the assistant's CLI tool
    #[arg(long)]
    pub ignore_agent_tools: bool,
}

/// Arguments for the templates command
#[derive(Parser, Debug)]
pub struct TemplatesArgs {
    /// Subcommand for templates
    #[command(subcommand)]
    pub action: TemplatesAction,
}

/// Templates subcommands
#[derive(Subcommand, Debug)]
pub enum TemplatesAction {
    /// Download the latest templates into the cache
    Sync {
        /// Sync even when the cache is already current
        #[arg(short, long)]
        force: bool,

        /// Use a local ZIP instead of downloading
        #[arg(long, value_name = "ZIP")]
        archive: Option<PathBuf>,
    },

    /// Show cache location, version and validity
    Status {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for the feature command
#[derive(Parser, Debug)]
pub struct FeatureArgs {
    /// Subcommand for feature
    #[command(subcommand)]
    pub action: FeatureAction,
}

/// Feature subcommands
#[derive(Subcommand, Debug)]
pub enum FeatureAction {
    /// Create a numbered feature branch and its spec
    Create {
        /// Feature description
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the implementation plan for the current feature
    Plan {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the current feature's design documents
    Check {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Update agent context files from the current plan
    Context {
        /// Only update this agent's file
        agent: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the current feature's paths
    Paths {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., templates.timeout_secs)
        key: String,
        /// Value to set
        value: String,
    },
}
