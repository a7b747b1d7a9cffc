//! Placeholder substitution for template files
//!
//! Templates use `{{.Name}}` actions. The vocabulary is small:
//!
//! | Action                   | Value (for `claude`) |
//! |--------------------------|----------------------|
//! | `{{.AIAssistant}}`       | `claude`             |
//! | `{{.AIAssistantName}}`   | `Claude Code`        |
//! | `{{.AIAssistantFolder}}` | `.claude`            |
//! | `{{"{{"}}`               | `{{` (literal)       |
//!
//! Files with a known binary extension are copied byte-for-byte.

use crate::agent::Agent;
use crate::error::{SpecifyError, SpecifyResult};
use crate::tree;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Extensions that are never treated as templates
const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", // executables and libraries
    "jpg", "jpeg", "png", "gif", "bmp", "ico", // images
    "mp3", "mp4", "avi", "mov", "wav", // media
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", // documents
    "zip", "tar", "gz", "7z", "rar", // archives
    "bin", "dat", "db", "sqlite", // data
];

/// True if the file should be copied without substitution
pub fn is_binary_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            BINARY_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Values available to templates
#[derive(Debug, Clone)]
pub struct RenderContext {
    agent: Agent,
}

impl RenderContext {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> Agent {
        self.agent
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "AIAssistant" => Some(self.agent.id().to_string()),
            "AIAssistantName" => Some(self.agent.display_name().to_string()),
            "AIAssistantFolder" => Some(self.agent.folder()),
            _ => None,
        }
    }

    /// Substitute every action in `input`. The error string describes the
    /// first bad action and its line.
    pub fn render_str(&self, input: &str) -> Result<String, String> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        let mut consumed = 0;

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let line = line_of(input, consumed + open);
            let after_open = &rest[open + 2..];
            let close = find_action_end(after_open)
                .ok_or_else(|| format!("unclosed action at line {}", line))?;
            let action = after_open[..close].trim();

            out.push_str(&self.evaluate(action).map_err(|e| format!("{} at line {}", e, line))?);

            let advance = open + 2 + close + 2;
            consumed += advance;
            rest = &rest[advance..];
        }

        out.push_str(rest);
        Ok(out)
    }

    fn evaluate(&self, action: &str) -> Result<String, String> {
        if let Some(name) = action.strip_prefix('.') {
            return self
                .lookup(name)
                .ok_or_else(|| format!("unknown variable .{}", name));
        }
        if action.len() >= 2 && action.starts_with('"') && action.ends_with('"') {
            return Ok(action[1..action.len() - 1].to_string());
        }
        Err(format!("unsupported action '{}'", action))
    }

    /// Copy `src` to `dest`, substituting placeholders in text files
    pub fn render_file(&self, src: &Path, dest: &Path) -> SpecifyResult<()> {
        if is_binary_path(src) {
            return tree::copy_file(src, dest);
        }

        let bytes = fs::read(src)
            .map_err(|e| SpecifyError::io(format!("reading template {}", src.display()), e))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                debug!("{} is not UTF-8, copying verbatim", src.display());
                return tree::copy_file(src, dest);
            }
        };

        let rendered = self
            .render_str(&text)
            .map_err(|reason| SpecifyError::TemplateRender {
                path: src.to_path_buf(),
                reason,
            })?;

        if let Some(parent) = dest.parent() {
            tree::ensure_dir(parent)?;
        }
        fs::write(dest, rendered)
            .map_err(|e| SpecifyError::io(format!("writing {}", dest.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = fs::metadata(src) {
                tree::set_mode(dest, meta.permissions().mode())?;
            }
        }
        Ok(())
    }

    /// Render a whole directory tree into `dest`
    pub fn render_tree(&self, src: &Path, dest: &Path) -> SpecifyResult<tree::CopyStats> {
        tree::copy_tree_with(src, dest, |from, to| self.render_file(from, to))
    }
}

/// Offset of the `}}` closing an action body, skipping over a quoted literal
fn find_action_end(body: &str) -> Option<usize> {
    let lead = body.len() - body.trim_start().len();
    if let Some(literal) = body[lead..].strip_prefix('"') {
        let after = lead + 1 + literal.find('"')? + 1;
        return body[after..].find("}}").map(|i| after + i);
    }
    body.find("}}")
}

fn line_of(input: &str, offset: usize) -> usize {
    input[..offset].matches('\n').count() + 1
}
