//! Init command - create a project from the templates

use super::current_dir;
use crate::agent::Agent;
use crate::cache::TemplateCache;
use crate::cli::args::InitArgs;
use crate::config::Config;
use crate::environment;
use crate::error::{SpecifyError, SpecifyResult};
use crate::git::SystemGit;
use crate::project::{GitOutcome, InitOptions, InitReport, ProjectInitializer, ProjectTarget};
use crate::remote;
use crate::tree;
use crate::ui::{self, DownloadProgress, UiContext};

/// Execute the init command
pub async fn execute(args: InitArgs, config: &Config) -> SpecifyResult<()> {
    let ctx = UiContext::detect().with_force(args.force);
    ui::intro(&ctx, "Specify Project Setup");

    let cwd = current_dir()?;
    let target = match (&args.name, args.here) {
        (_, true) => ProjectTarget::Here(cwd),
        (Some(name), false) => ProjectTarget::New(cwd.join(name)),
        (None, false) => {
            return Err(SpecifyError::User(
                "Specify a project name or use --here".to_string(),
            ))
        }
    };

    if let ProjectTarget::Here(ref dir) = target {
        if !tree::is_dir_empty(dir)? {
            let proceed = ui::confirm_merge(&ctx, dir).await?;
            if !proceed {
                ui::outro_warn(&ctx, "Initialization cancelled");
                return Ok(());
            }
        }
    }

    let agent = choose_agent(&ctx, &args, config).await?;
    ui::step_ok_detail(&ctx, "AI assistant", agent.display_name());

    if !args.ignore_agent_tools {
        if let Some(tool) = environment::missing_agent_tool(agent) {
            ui::step_warn_hint(
                &ctx,
                &format!("{} not found on PATH", tool),
                agent.install_hint(),
            );
        }
    }

    let cache = TemplateCache::open(config.templates.cache_dir.as_deref())?;
    let source = remote::create_source(&config.templates, None);
    let progress = DownloadProgress::new(&ctx, &config.templates.asset_name);
    let initializer = ProjectInitializer::new(cache, source, config.templates.asset_name.clone())
        .with_progress(progress.reporter());

    let options = InitOptions {
        target,
        agent,
        git: !args.no_git && config.init.git,
    };
    let git = SystemGit::new();

    let result = initializer.initialize(&options, &git).await;
    progress.finish(
        result
            .as_ref()
            .ok()
            .and_then(|report| report.synced.as_ref())
            .map(|sync| sync.bytes),
    );
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            ui::outro_error(&ctx, "Project initialization failed");
            return Err(e);
        }
    };

    print_report(&ctx, &report);
    Ok(())
}

async fn choose_agent(ctx: &UiContext, args: &InitArgs, config: &Config) -> SpecifyResult<Agent> {
    if let Some(ref id) = args.ai {
        return id.parse();
    }
    if let Some(agent) = config.init.default_agent {
        return Ok(agent);
    }

    ui::select_agent(ctx).await
}

fn print_report(ctx: &UiContext, report: &InitReport) {
    if let Some(ref sync) = report.synced {
        ui::step_ok_detail(
            ctx,
            "Templates synced",
            &format!("{} files from {}", sync.entries, sync.release),
        );
    }
    ui::step_ok_detail(
        ctx,
        "Templates placed",
        &format!(
            "{} layout, {} files",
            report.placement.shape.name(),
            report.placement.stats.files
        ),
    );

    for doc in &report.documents {
        let name = doc
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ui::step_ok(ctx, &format!("{} {}", capitalize(doc.outcome.verb()), name));
    }

    match &report.git {
        GitOutcome::Initialized => ui::step_ok(ctx, "Initialized git repository"),
        GitOutcome::Existing => ui::step_info(ctx, "Existing git repository detected"),
        GitOutcome::Skipped(reason) => ui::step_info(ctx, &format!("Git skipped ({})", reason)),
        GitOutcome::Failed(reason) => {
            ui::step_warn_hint(ctx, "Git initialization failed", reason)
        }
    }

    ui::next_steps(ctx, &report.next_steps());
    ui::outro_success(
        ctx,
        &format!("Project ready at {}", report.path.display()),
    );
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
