//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::remote::ProgressFn;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows immediately in interactive mode)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            // Plain output for CI
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Clear the spinner without any message
    pub fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.clear();
        }
    }
}

/// Byte-count progress bar for template downloads.
///
/// Draws an indicatif bar in interactive mode; in CI it prints one line
/// when finished.
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
    label: String,
}

impl DownloadProgress {
    pub fn new(ctx: &UiContext, label: &str) -> Self {
        let bar = ctx.use_fancy_output().then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {prefix}  {bar:20.cyan/dim} {bytes}/{total_bytes} {bytes_per_sec:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─");
            bar.set_style(style);
            bar.set_prefix(label.to_string());
            bar
        });
        Self {
            bar,
            label: label.to_string(),
        }
    }

    /// Callback handed to the downloader
    pub fn reporter(&self) -> Arc<ProgressFn> {
        let bar = self.bar.clone();
        Arc::new(move |done: u64, total: Option<u64>| {
            if let Some(ref bar) = bar {
                if let Some(total) = total {
                    bar.set_length(total);
                }
                bar.set_position(done);
            }
        })
    }

    /// Clear the bar and report the size, if anything was downloaded
    pub fn finish(&self, bytes: Option<u64>) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        if let Some(bytes) = bytes {
            println!(
                "{} {} ({})",
                style("Downloaded").dim(),
                self.label,
                format_bytes(bytes)
            );
        }
    }
}

/// Human-readable size, e.g. `1.5 MB`
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_plain() {
        let ctx = UiContext::plain();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Checking environment...");
        spinner.clear();
        // Should not panic
    }

    #[test]
    fn download_progress_plain() {
        let ctx = UiContext::plain();
        let progress = DownloadProgress::new(&ctx, "templates.zip");
        let report = progress.reporter();
        report(512, Some(1024));
        report(1024, None);
        progress.finish(Some(1024));
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
