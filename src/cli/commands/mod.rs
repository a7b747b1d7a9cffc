//! CLI command implementations

pub mod check;
pub mod completions;
pub mod config;
pub mod feature;
pub mod init;
pub mod templates;

pub use check::execute as check;
pub use completions::execute as completions;
pub use config::execute as config;
pub use feature::execute as feature;
pub use init::execute as init;
pub use templates::execute as templates;

use crate::error::{SpecifyError, SpecifyResult};
use serde::Serialize;
use std::path::PathBuf;

/// Print `value` as pretty JSON on stdout
fn print_json<T: Serialize>(value: &T) -> SpecifyResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn current_dir() -> SpecifyResult<PathBuf> {
    std::env::current_dir().map_err(|e| SpecifyError::io("getting current directory", e))
}
