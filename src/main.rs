//! Specify - spec-driven project scaffolding
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use specify::cli::{Cli, Commands};
use specify::config::{Config, ConfigManager};
use specify::error::SpecifyResult;
use specify::ui;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SpecifyResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions { shell } = cli.command {
        return specify::cli::commands::completions(shell);
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config: Config = config_manager.load().await?;

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Using config {}", config_manager.path().display());

    if let Some(dir) = cli.cache_dir {
        debug!("Template cache overridden: {}", dir.display());
        config.templates.cache_dir = Some(dir);
    }

    ui::init_theme();

    // Dispatch to command
    match cli.command {
        Commands::Init(args) => specify::cli::commands::init(args, &config).await,
        Commands::Templates(args) => specify::cli::commands::templates(args, &config).await,
        Commands::Feature(args) => specify::cli::commands::feature(args).await,
        Commands::Check => specify::cli::commands::check(&config).await,
        Commands::Config(args) => {
            specify::cli::commands::config(args, &config, &config_manager).await
        }
        Commands::Completions { .. } => unreachable!("Completions handled above"),
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("specify=warn"),
        1 => EnvFilter::new("specify=info"),
        _ => EnvFilter::new("specify=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
