//! Feature command - spec/plan workflow on numbered feature branches
//!
//! Plain output is `KEY: value` lines so scripts and agent commands can
//! read it; `--json` prints the same fields as an object.

use super::{current_dir, print_json};
use crate::agent::Agent;
use crate::cli::args::{FeatureAction, FeatureArgs};
use crate::error::SpecifyResult;
use crate::feature::{ContextUpdate, FeatureService};
use crate::git::SystemGit;
use crate::ui::{self, UiContext};
use chrono::Local;
use std::path::Path;

/// Execute the feature command
pub async fn execute(args: FeatureArgs) -> SpecifyResult<()> {
    let git = SystemGit::new();
    let service = FeatureService::new(&git, current_dir()?);

    match args.action {
        FeatureAction::Create { description, json } => {
            let created = service.create(&description.join(" ")).await?;
            if json {
                return print_json(&created);
            }
            line("BRANCH_NAME", &created.branch_name);
            path_line("SPEC_FILE", &created.spec_file);
            line("FEATURE_NUM", &created.feature_num);
        }
        FeatureAction::Plan { json } => {
            let plan = service.plan().await?;
            if json {
                return print_json(&plan);
            }
            path_line("FEATURE_SPEC", &plan.feature_spec);
            path_line("IMPL_PLAN", &plan.impl_plan);
            path_line("SPECS_DIR", &plan.specs_dir);
            line("BRANCH", &plan.branch);
        }
        FeatureAction::Check { json } => {
            let check = service.check().await?;
            if json {
                return print_json(&check);
            }
            path_line("FEATURE_DIR", &check.feature_dir);
            println!("AVAILABLE_DOCS:");
            for doc in &check.available_docs {
                println!("  {}", doc);
            }
        }
        FeatureAction::Context { agent, json } => {
            let agent = agent.map(|id| id.parse::<Agent>()).transpose()?;
            let update = service.context(agent, Local::now().date_naive()).await?;
            if json {
                return print_json(&update);
            }
            print_context(&UiContext::detect(), &update);
        }
        FeatureAction::Paths { json } => {
            let paths = service.paths().await?;
            if json {
                return print_json(&paths);
            }
            path_line("REPO_ROOT", &paths.repo_root);
            line("BRANCH", &paths.branch);
            path_line("FEATURE_DIR", &paths.feature_dir);
            path_line("FEATURE_SPEC", &paths.feature_spec);
            path_line("IMPL_PLAN", &paths.impl_plan);
            path_line("TASKS", &paths.tasks);
        }
    }

    Ok(())
}

fn line(key: &str, value: &str) {
    println!("{}: {}", key, value);
}

fn path_line(key: &str, path: &Path) {
    line(key, &path.display().to_string());
}

fn print_context(ctx: &UiContext, update: &ContextUpdate) {
    ui::section(ctx, &format!("Agent context for {}", update.branch));
    for file in &update.updates {
        let verb = if file.created { "Created" } else { "Updated" };
        ui::step_ok_detail(
            ctx,
            &format!("{} {} context", verb, file.agent),
            &file.path.display().to_string(),
        );
    }
    if update.summary.is_empty() {
        ui::remark(ctx, "No technology details found in plan.md");
    }
    for item in &update.summary {
        ui::remark(ctx, item);
    }
}
