//! Workspace temp-file cleanup.
//!
//! Removes the artifacts previous runs leave behind: coverage output, the
//! pinned-tool cache, and (with `deep`) the whole `target/` tree. Only
//! paths joined onto the workspace root are ever touched.

use crate::error::{PreflightError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the workspace root holding preflight's own state
/// (tool cache, default report location).
pub const STATE_DIR: &str = ".preflight";

/// What a cleanup pass removed.
#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub removed: Vec<PathBuf>,
}

/// Delete run artifacts under `root`.
pub fn clean_workspace(root: &Path, deep: bool) -> Result<CleanOutcome> {
    if !root.is_dir() {
        return Err(PreflightError::WorkspaceNotFound(root.to_path_buf()));
    }

    let mut candidates = vec![
        root.join("lcov.info"),
        root.join("target").join("llvm-cov"),
        root.join(STATE_DIR),
    ];
    if deep {
        candidates.push(root.join("target"));
    }

    let mut outcome = CleanOutcome::default();
    for path in candidates {
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else if path.is_file() {
            std::fs::remove_file(&path)?;
        } else {
            continue;
        }
        debug!(path = %path.display(), "removed");
        outcome.removed.push(path);
    }

    Ok(outcome)
}
