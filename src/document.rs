//! Generated documents with one tool-owned section
//!
//! A document may carry a single `<specify>...</specify>` region. Merging
//! rewrites only that region and leaves every other byte alone, so users
//! can keep their own notes around it. Marker counts other than zero or
//! one pair are refused rather than repaired.

use crate::error::{SpecifyError, SpecifyResult};
use crate::tree;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

pub const OPEN_MARKER: &str = "<specify>";
pub const CLOSE_MARKER: &str = "</specify>";

/// A complete delimited block, markers included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section(String);

impl Section {
    /// Wrap `body` in markers
    pub fn wrap(body: &str) -> Self {
        Self(format!("{}{}{}", OPEN_MARKER, body, CLOSE_MARKER))
    }

    /// The first marked span in `text`, markers included
    pub fn extract(text: &str) -> Option<Self> {
        let start = text.find(OPEN_MARKER)?;
        let len = text[start..].find(CLOSE_MARKER)? + CLOSE_MARKER.len();
        Some(Self(text[start..start + len].to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Boilerplate for a document that does not exist yet
#[derive(Debug, Clone, Copy)]
pub struct NewDocument<'a> {
    pub title: &'a str,
    pub intro: &'a str,
}

impl NewDocument<'_> {
    pub fn render(&self, section: &Section) -> String {
        format!("# {}\n\n{}\n\n{}\n", self.title, self.intro, section)
    }
}

/// What a merge did to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Replaced,
    Appended,
}

impl MergeOutcome {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Replaced => "updated",
            Self::Appended => "appended to",
        }
    }
}

/// Merge `section` into `existing` text.
///
/// One pair: the span from opening through closing marker is replaced.
/// No markers: the section is appended after a newline. Anything else is
/// an error describing the problem.
pub fn merge(existing: &str, section: &Section) -> Result<(String, MergeOutcome), String> {
    let opens = existing.matches(OPEN_MARKER).count();
    let closes = existing.matches(CLOSE_MARKER).count();

    if opens > 1 || closes > 1 {
        return Err(format!(
            "found {} opening and {} closing markers, expected at most one pair",
            opens, closes
        ));
    }
    if opens != closes {
        return Err(format!(
            "unbalanced markers ({} opening, {} closing)",
            opens, closes
        ));
    }

    if opens == 0 {
        let merged = format!("{}\n{}\n", existing, section);
        return Ok((merged, MergeOutcome::Appended));
    }

    let (start, end) = match (existing.find(OPEN_MARKER), existing.find(CLOSE_MARKER)) {
        (Some(start), Some(close)) if close > start => (start, close + CLOSE_MARKER.len()),
        _ => return Err("closing marker appears before opening marker".to_string()),
    };

    let mut merged = String::with_capacity(existing.len() + section.as_str().len());
    merged.push_str(&existing[..start]);
    merged.push_str(section.as_str());
    merged.push_str(&existing[end..]);
    Ok((merged, MergeOutcome::Replaced))
}

/// Create or update the document at `path`.
///
/// A malformed document is left untouched on disk.
pub fn merge_file(
    path: &Path,
    fresh: NewDocument<'_>,
    section: &Section,
) -> SpecifyResult<MergeOutcome> {
    let (content, outcome) = match fs::read_to_string(path) {
        Ok(existing) => merge(&existing, section).map_err(|reason| {
            SpecifyError::MalformedDocument {
                path: path.to_path_buf(),
                reason,
            }
        })?,
        Err(e) if e.kind() == ErrorKind::NotFound => (fresh.render(section), MergeOutcome::Created),
        Err(e) => return Err(SpecifyError::io(format!("reading {}", path.display()), e)),
    };

    tree::atomic_write(path, content.as_bytes())?;
    debug!("{} {}", outcome.verb(), path.display());
    Ok(outcome)
}
