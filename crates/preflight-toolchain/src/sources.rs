//! Native-extension source discovery.
//!
//! clang-format operates on the C/C++/CUDA sources of the workspace's
//! native-extension crates; this walker finds them.

use crate::error::Result;
use std::path::{Path, PathBuf};

const NATIVE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cu", "cuh", "h", "hpp"];

/// Collect all native source files under a workspace root, sorted for
/// deterministic command lines.
pub fn collect_native_sources(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_recursive(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = path.file_name().unwrap_or_default().to_string_lossy();

        // Skip hidden files, build output, and vendored trees
        if name.starts_with('.') || name == "target" || name == "node_modules" {
            continue;
        }

        if path.is_file() {
            if let Some(ext) = path.extension() {
                if NATIVE_EXTENSIONS.iter().any(|e| ext == *e) {
                    files.push(path);
                }
            }
        } else if path.is_dir() {
            collect_recursive(&path, files)?;
        }
    }

    Ok(())
}
