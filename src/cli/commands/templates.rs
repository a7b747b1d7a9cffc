//! Templates command - sync and inspect the template cache

use super::print_json;
use crate::cache::{CacheStatus, SyncReport, TemplateCache, TemplateResolver};
use crate::cli::args::{TemplatesAction, TemplatesArgs};
use crate::config::Config;
use crate::error::{SpecifyError, SpecifyResult};
use crate::remote;
use crate::ui::{self, DownloadProgress, UiContext};
use std::path::PathBuf;
use tracing::debug;

/// Execute the templates command
pub async fn execute(args: TemplatesArgs, config: &Config) -> SpecifyResult<()> {
    let cache = TemplateCache::open(config.templates.cache_dir.as_deref())?;

    match args.action {
        TemplatesAction::Sync { force, archive } => sync(cache, config, force, archive).await,
        TemplatesAction::Status { json } => status(cache, json).await,
    }
}

async fn sync(
    cache: TemplateCache,
    config: &Config,
    force: bool,
    archive: Option<PathBuf>,
) -> SpecifyResult<()> {
    let ctx = UiContext::detect();

    if !force {
        if let Ok(manifest) = cache.read_manifest() {
            if manifest.is_compatible_with(cache.version()) {
                ui::step_ok_detail(
                    &ctx,
                    "Templates are up to date",
                    &format!(
                        "{} files, synced {}",
                        manifest.entries.len(),
                        manifest.last_sync.format("%Y-%m-%d %H:%M UTC")
                    ),
                );
                ui::remark(&ctx, "Use --force to sync again");
                return Ok(());
            }
            debug!(
                "Cache version {} does not match {}",
                manifest.tool_version,
                cache.version()
            );
        }
    }

    let source = remote::create_source(&config.templates, archive.as_deref());
    ui::step_info(&ctx, &format!("Syncing templates from {}", source.describe()));

    let progress = DownloadProgress::new(&ctx, &config.templates.asset_name);
    let reporter = progress.reporter();
    let asset_name = config.templates.asset_name.clone();
    let root = cache.root().to_path_buf();

    let result: SpecifyResult<SyncReport> = tokio::task::spawn_blocking(move || {
        TemplateResolver::new(&cache, source.as_ref(), asset_name)
            .with_progress(reporter)
            .sync()
    })
    .await
    .map_err(|e| SpecifyError::Internal(format!("sync task failed: {}", e)))?;

    progress.finish(result.as_ref().ok().map(|report| report.bytes));
    let report = result?;

    ui::step_ok_detail(
        &ctx,
        &format!("Synced {} template files", report.entries),
        &format!("{} from {}", report.asset, report.release),
    );
    ui::key_value(&ctx, "Cache", &root.display().to_string());
    Ok(())
}

async fn status(cache: TemplateCache, json: bool) -> SpecifyResult<()> {
    let status = tokio::task::spawn_blocking(move || cache.status())
        .await
        .map_err(|e| SpecifyError::Internal(format!("status task failed: {}", e)))?;

    if json {
        return print_json(&status);
    }

    let ctx = UiContext::detect();
    print_status(&ctx, &status);
    Ok(())
}

fn print_status(ctx: &UiContext, status: &CacheStatus) {
    ui::section(ctx, "Template cache");
    ui::key_value(ctx, "Location", &status.root.display().to_string());
    ui::key_value(ctx, "Tool version", &status.tool_version);

    if status.empty {
        ui::key_value_status(ctx, "State", "empty", false);
        ui::remark(ctx, "Run: specify templates sync");
        return;
    }

    ui::key_value(
        ctx,
        "Cache version",
        status.cache_version.as_deref().unwrap_or("unknown"),
    );
    if let Some(last_sync) = status.last_sync {
        ui::key_value(
            ctx,
            "Last sync",
            &last_sync.format("%Y-%m-%d %H:%M UTC").to_string(),
        );
    }
    ui::key_value(ctx, "Files", &status.entries.to_string());

    match &status.problem {
        None => ui::key_value_status(ctx, "State", "valid", true),
        Some(problem) => {
            ui::key_value_status(ctx, "State", problem, false);
            ui::remark(ctx, "Run: specify templates sync --force");
        }
    }
}
