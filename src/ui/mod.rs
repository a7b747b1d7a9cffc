//! Terminal output for specify commands
//!
//! `cliclack` draws prompts and step lines on a terminal; in CI and pipes
//! every helper prints a plain tagged line instead and prompts take their
//! safe default.
//!
//! ```rust,ignore
//! use specify::ui::{self, UiContext};
//!
//! let ctx = UiContext::detect().with_force(args.force);
//! ui::intro(&ctx, "Specify Project Setup");
//!
//! if !ui::confirm_merge(&ctx, &cwd).await? {
//!     ui::outro_warn(&ctx, "Initialization cancelled");
//!     return Ok(());
//! }
//! let agent = ui::select_agent(&ctx).await?;
//!
//! ui::step_ok_detail(&ctx, "Templates placed", "mixed layout, 12 files");
//! ui::next_steps(&ctx, &report.next_steps());
//! ui::outro_success(&ctx, "Project ready");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, next_steps, outro_error, outro_success, outro_warn,
    remark, section, step_error_detail, step_info, step_ok, step_ok_detail, step_warn_hint,
};
pub use progress::{format_bytes, DownloadProgress, TaskSpinner};
pub use prompts::{confirm_merge, select_agent};
pub use theme::{init_theme, SpecifyTheme};
