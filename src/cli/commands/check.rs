//! Check command - tools, connectivity and template cache

use crate::cache::TemplateCache;
use crate::config::Config;
use crate::environment::{self, EnvironmentReport};
use crate::error::SpecifyResult;
use crate::git::SystemGit;
use crate::ui::{TaskSpinner, UiContext};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the check command
pub async fn execute(config: &Config) -> SpecifyResult<()> {
    let ctx = UiContext::detect();
    let cache = TemplateCache::open(config.templates.cache_dir.as_deref())?;
    let git = SystemGit::new();

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Checking environment...");
    let report = environment::inspect(
        &config.templates.api_base,
        config.templates.timeout(),
        &git,
        &cache,
    )
    .await;
    spinner.clear();

    print_report(&report);
    Ok(())
}

fn print_report(report: &EnvironmentReport) {
    println!("{}", style("Specify Environment Check").bold().cyan());
    println!();

    println!("{}", style("System:").bold());
    println!("  {} Platform: {}", CHECK, report.platform);
    if let Some(ref cwd) = report.cwd {
        println!("  {} Directory: {}", CHECK, cwd.display());
    }

    println!();
    println!("{}", style("Connectivity:").bold());
    if report.connectivity.reachable {
        println!(
            "  {} {} {}",
            CHECK,
            style("Reachable").green(),
            report.connectivity.url
        );
    } else {
        println!(
            "  {} {} {} - {}",
            CROSS,
            style("Unreachable").red(),
            report.connectivity.url,
            report.connectivity.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!();
    println!("{}", style("Git:").bold());
    if report.git.available {
        println!("  {} {}", CHECK, style("Installed").green());
        match (&report.git.user_name, &report.git.user_email) {
            (Some(name), Some(email)) => println!("  {} User: {} <{}>", CHECK, name, email),
            _ => println!(
                "  {} {} - Run: git config --global user.name/user.email",
                WARN,
                style("Identity not configured").yellow()
            ),
        }
    } else {
        println!(
            "  {} {} - Install from https://git-scm.com/downloads",
            WARN,
            style("Not installed").yellow()
        );
    }

    println!();
    println!("{}", style("AI assistant CLIs:").bold());
    for tool in &report.agents {
        match (&tool.path, &tool.version) {
            (Some(_), version) => println!(
                "  {} {} - {}",
                CHECK,
                style(&tool.name).green(),
                version.as_deref().unwrap_or("version unknown")
            ),
            (None, _) => println!(
                "  {} {} - Not found. Install: {}",
                WARN,
                style(&tool.name).yellow(),
                tool.install_hint.as_deref().unwrap_or("see the assistant's documentation")
            ),
        }
    }

    println!();
    println!("{}", style("Template cache:").bold());
    println!("  {} Location: {}", CHECK, report.cache.root.display());
    match (&report.cache.problem, report.cache.empty) {
        (_, true) => println!(
            "  {} {} - Run: specify templates sync",
            WARN,
            style("Empty").yellow()
        ),
        (None, false) => println!(
            "  {} {} ({} files)",
            CHECK,
            style("Valid").green(),
            report.cache.entries
        ),
        (Some(problem), false) => println!(
            "  {} {} - {}",
            CROSS,
            style("Invalid").red(),
            problem
        ),
    }

    println!();
    if report.can_initialize() {
        println!("{}", style("Ready to initialize projects").green().bold());
    } else {
        println!(
            "{}",
            style("Templates unavailable: no network access and no valid cache")
                .yellow()
                .bold()
        );
    }
}
