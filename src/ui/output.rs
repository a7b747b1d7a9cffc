//! Step and report lines for init, sync and status
//!
//! Every line goes through cliclack on a terminal and through a tagged
//! plain line otherwise, so CI logs stay greppable (`[OK]`, `[WARN]`).

use super::context::UiContext;
use console::{style, StyledObject};

/// Outcome shown in front of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Tag {
    fn plain(self) -> StyledObject<&'static str> {
        match self {
            Tag::Ok => style("[OK]").green(),
            Tag::Warn => style("[WARN]").yellow(),
            Tag::Fail => style("[FAIL]").red(),
            Tag::Info => style("[INFO]").cyan(),
        }
    }

    fn log(self, message: String) {
        let _ = match self {
            Tag::Ok => cliclack::log::success(message),
            Tag::Warn => cliclack::log::warning(message),
            Tag::Fail => cliclack::log::error(message),
            Tag::Info => cliclack::log::info(message),
        };
    }
}

fn step(ctx: &UiContext, tag: Tag, message: String) {
    if ctx.use_fancy_output() {
        tag.log(message);
    } else {
        println!("  {} {}", tag.plain(), message);
    }
}

fn outro(ctx: &UiContext, tag: Tag, message: &str) {
    if ctx.use_fancy_output() {
        let styled = match tag {
            Tag::Ok => style(message).green().bold(),
            Tag::Fail => style(message).red().bold(),
            Tag::Warn | Tag::Info => style(message).yellow().bold(),
        };
        cliclack::outro(styled).ok();
    } else {
        println!();
        println!("{} {}", tag.plain(), message);
    }
}

/// Banner opening an interactive flow
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
        println!();
    }
}

pub fn outro_success(ctx: &UiContext, message: &str) {
    outro(ctx, Tag::Ok, message);
}

pub fn outro_warn(ctx: &UiContext, message: &str) {
    outro(ctx, Tag::Warn, message);
}

pub fn outro_error(ctx: &UiContext, message: &str) {
    outro(ctx, Tag::Fail, message);
}

/// Numbered follow-ups after a project is created
pub fn next_steps(ctx: &UiContext, steps: &[String]) {
    let body = numbered(steps);
    if ctx.use_fancy_output() {
        cliclack::note("Next steps", body).ok();
    } else {
        println!();
        println!("{}", style("Next steps:").bold());
        for line in body.lines() {
            println!("  {}", line);
        }
    }
}

fn numbered(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        cliclack::log::info(style(title).bold()).ok();
    } else {
        println!("{}", style(title).bold());
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    step(ctx, Tag::Ok, message.to_string());
}

/// e.g. `Templates placed (mixed layout, 12 files)`
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    step(ctx, Tag::Ok, format!("{} ({})", message, style(detail).dim()));
}

pub fn step_info(ctx: &UiContext, message: &str) {
    step(ctx, Tag::Info, message.to_string());
}

/// A recoverable problem plus what to do about it
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    step(ctx, Tag::Warn, format!("{} - {}", message, style(hint).dim()));
}

pub fn step_error_detail(ctx: &UiContext, message: &str, detail: &str) {
    step(ctx, Tag::Fail, format!("{}: {}", message, style(detail).red()));
}

/// Dim follow-up line, usually a command to run next
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

/// A status field, green when healthy and yellow otherwise
pub fn key_value_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    if ctx.use_fancy_output() {
        let value = if ok {
            style(value).green()
        } else {
            style(value).yellow()
        };
        println!("  {}: {}", style(key).dim(), value);
    } else {
        let tag = if ok { Tag::Ok } else { Tag::Warn };
        println!("  {} {}: {}", tag.plain(), key, value);
    }
}
