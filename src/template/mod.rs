//! Template trees: shape detection, placement and placeholder substitution

pub mod layout;
pub mod render;

pub use layout::{Placement, Placer, TreeShape, MEMORY_DIR, UNIFIED_DIRS};
pub use render::{is_binary_path, RenderContext};
