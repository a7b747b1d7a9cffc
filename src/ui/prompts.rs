//! Questions `init` asks, answered with safe defaults when nobody can answer

use super::context::UiContext;
use super::output;
use crate::agent::Agent;
use crate::error::{SpecifyError, SpecifyResult};
use std::io::ErrorKind;
use std::path::Path;

/// Ask before merging templates into a non-empty directory.
///
/// `--force` answers yes; without a terminal the answer is no.
pub async fn confirm_merge(ctx: &UiContext, dir: &Path) -> SpecifyResult<bool> {
    if ctx.force() {
        output::remark(
            ctx,
            &format!("{} is not empty, merging (--force)", dir.display()),
        );
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(false);
    }

    let message = format!(
        "{} is not empty. Template files will be merged with existing content. Continue?",
        dir.display()
    );
    ask(move || cliclack::confirm(message).initial_value(false).interact()).await
}

/// Pick the assistant to set up; the first one without a terminal
pub async fn select_agent(ctx: &UiContext) -> SpecifyResult<Agent> {
    if !ctx.is_interactive() {
        return Ok(Agent::ALL[0]);
    }

    ask(|| {
        let mut select = cliclack::select("Choose your AI assistant");
        for agent in Agent::ALL {
            select = select.item(agent, agent.display_name(), agent.folder());
        }
        select.interact()
    })
    .await
}

/// Run a blocking cliclack prompt off the runtime. Esc and Ctrl-C cancel init.
async fn ask<T, F>(prompt: F) -> SpecifyResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| SpecifyError::Internal(format!("prompt task failed: {}", e)))?
        .map_err(|e| match e.kind() {
            ErrorKind::Interrupted => SpecifyError::User("Initialization cancelled".to_string()),
            _ => SpecifyError::io("reading prompt answer", e),
        })
}
