//! Deterministic directory scan for model artifacts
//!
//! Searches a directory tree for the first directory containing the `MLmodel`
//! descriptor. Traversal is depth-first with children visited in lexicographic
//! filename order, so the result does not depend on the platform's directory
//! iteration order.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker file identifying a model artifact directory
pub const MODEL_MARKER: &str = "MLmodel";

/// Find the first marker-bearing directory under `root`.
///
/// The root itself is a candidate. Returns `None` when no marker exists
/// anywhere in the tree. The caller is expected to have checked that `root`
/// exists.
pub fn find_model_dir(root: &Path) -> std::io::Result<Option<PathBuf>> {
    if root.join(MODEL_MARKER).is_file() {
        debug!(path = %root.display(), "Found model marker");
        return Ok(Some(root.to_path_buf()));
    }

    let mut children: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    for child in children {
        if let Some(found) = find_model_dir(&child)? {
            return Ok(Some(found));
        }
    }

    Ok(None)
}
