//! Structure classification and placement of template trees
//!
//! Template archives have shipped in three shapes over time. The shape is
//! decided once, from the top-level entries, and placement follows it:
//!
//! | Shape   | Detected by                                | Placement                                   |
//! |---------|--------------------------------------------|---------------------------------------------|
//! | Mixed   | any `.{agent}` directory for a known agent | requested agent folder + unified dirs to `.{agent}/`, `memory/` to root, other entries to root |
//! | Unified | `commands/`, `templates/` or `tools/`      | every directory but `memory/` to `.{agent}/`, `memory/` to root |
//! | Legacy  | neither                                    | whole tree merged into the root             |
//!
//! Hidden folders of agents other than the requested one are not placed.

use super::render::RenderContext;
use crate::agent::Agent;
use crate::error::{SpecifyError, SpecifyResult};
use crate::tree::{self, CopyStats};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory names that mark the purpose-organized layout
pub const UNIFIED_DIRS: [&str; 3] = ["commands", "templates", "tools"];

/// Shared directory that always lands at the project root
pub const MEMORY_DIR: &str = "memory";

/// The shape of an extracted template tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeShape {
    /// Agent hidden folders present, possibly next to unified directories
    Mixed { has_unified: bool },
    /// Only purpose-organized directories
    Unified,
    /// Anything else, copied through as-is
    Legacy,
}

impl TreeShape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mixed { .. } => "mixed",
            Self::Unified => "unified",
            Self::Legacy => "legacy",
        }
    }
}

/// A top-level entry of the tree being placed
#[derive(Debug, Clone)]
struct TopEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// What a placement did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub shape: TreeShape,
    pub stats: CopyStats,
}

/// Classify and place a template tree into a project for one agent
pub struct Placer<'a> {
    root: &'a Path,
    ignore: &'a [&'a str],
}

impl<'a> Placer<'a> {
    /// Place the tree rooted at `root`
    pub fn new(root: &'a Path) -> Self {
        Self { root, ignore: &[] }
    }

    /// Top-level names that are neither classified nor placed
    pub fn ignoring(mut self, names: &'a [&'a str]) -> Self {
        self.ignore = names;
        self
    }

    /// Decide the tree's shape from its top-level entries
    pub fn classify(&self) -> SpecifyResult<TreeShape> {
        Ok(shape_of(&self.entries()?))
    }

    /// Copy the tree into `target` according to its shape
    pub fn place(&self, target: &Path, agent: Agent) -> SpecifyResult<Placement> {
        let entries = self.entries()?;
        let shape = shape_of(&entries);
        info!(
            "Placing {} template tree from {} for {}",
            shape.name(),
            self.root.display(),
            agent
        );

        tree::ensure_dir(target)?;
        let renderer = RenderContext::new(agent);
        let agent_target = target.join(agent.folder());

        let stats = match shape {
            TreeShape::Legacy => place_legacy(&entries, target)?,
            TreeShape::Unified => place_unified(&entries, target, &agent_target, &renderer)?,
            TreeShape::Mixed { .. } => {
                place_mixed(&entries, target, &agent_target, agent, &renderer)?
            }
        };

        Ok(Placement { shape, stats })
    }

    fn entries(&self) -> SpecifyResult<Vec<TopEntry>> {
        let read_err =
            |e| SpecifyError::io(format!("listing template tree {}", self.root.display()), e);

        let mut entries = Vec::new();
        for entry in fs::read_dir(self.root).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.ignore.contains(&name.as_str()) {
                continue;
            }
            let is_dir = entry.file_type().map_err(read_err)?.is_dir();
            entries.push(TopEntry {
                name,
                path: entry.path(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn shape_of(entries: &[TopEntry]) -> TreeShape {
    let has_agent_folder = entries
        .iter()
        .any(|e| e.is_dir && Agent::from_folder(&e.name).is_some());
    let has_unified = entries
        .iter()
        .any(|e| e.is_dir && UNIFIED_DIRS.contains(&e.name.as_str()));

    if has_agent_folder {
        TreeShape::Mixed { has_unified }
    } else if has_unified {
        TreeShape::Unified
    } else {
        TreeShape::Legacy
    }
}

fn place_legacy(entries: &[TopEntry], target: &Path) -> SpecifyResult<CopyStats> {
    let mut stats = CopyStats::default();

    for entry in entries {
        let dest = target.join(&entry.name);
        if entry.is_dir {
            stats.add(tree::merge_directories(&entry.path, &dest)?);
            stats.dirs += 1;
        } else {
            tree::copy_file(&entry.path, &dest)?;
            stats.files += 1;
        }
    }

    Ok(stats)
}

fn place_unified(
    entries: &[TopEntry],
    target: &Path,
    agent_target: &Path,
    renderer: &RenderContext,
) -> SpecifyResult<CopyStats> {
    let mut stats = CopyStats::default();

    for entry in entries {
        if !entry.is_dir {
            debug!("Skipping top-level file {} in unified tree", entry.name);
            continue;
        }
        let dest = if entry.name == MEMORY_DIR {
            target.join(MEMORY_DIR)
        } else {
            agent_target.join(&entry.name)
        };
        stats.add(renderer.render_tree(&entry.path, &dest)?);
    }

    Ok(stats)
}

fn place_mixed(
    entries: &[TopEntry],
    target: &Path,
    agent_target: &Path,
    agent: Agent,
    renderer: &RenderContext,
) -> SpecifyResult<CopyStats> {
    let mut stats = CopyStats::default();
    let own_folder = agent.folder();

    for entry in entries {
        let name = entry.name.as_str();

        if entry.is_dir && name == own_folder {
            stats.add(renderer.render_tree(&entry.path, agent_target)?);
        } else if entry.is_dir && UNIFIED_DIRS.contains(&name) {
            stats.add(renderer.render_tree(&entry.path, &agent_target.join(name))?);
        } else if entry.is_dir && name == MEMORY_DIR {
            stats.add(renderer.render_tree(&entry.path, &target.join(MEMORY_DIR))?);
        } else if entry.is_dir && Agent::from_folder(name).is_some() {
            debug!("Ignoring {} folder while placing for {}", name, agent);
        } else if entry.is_dir {
            stats.add(tree::merge_directories(&entry.path, &target.join(name))?);
        } else {
            tree::copy_file(&entry.path, &target.join(name))?;
            stats.files += 1;
        }
    }

    Ok(stats)
}
