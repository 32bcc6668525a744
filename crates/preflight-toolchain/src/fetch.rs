//! Pinned-tool download with digest verification.
//!
//! When a checker's binary is not on PATH the orchestrator can fetch a
//! pinned build into the workspace tool cache. The download is verified
//! against a pinned SHA-256 before it is ever marked executable; a
//! mismatching file is deleted rather than kept around.

use crate::error::{Result, ToolchainError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A tool pinned to a specific build by URL and digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinnedTool {
    /// Binary name (also the cache file name).
    pub name: String,

    /// Download URL for the host platform.
    pub url: String,

    /// Expected SHA-256 of the binary, as lowercase hex.
    pub sha256: String,
}

impl PinnedTool {
    /// The pinned clang-format build, taken from deployment configuration.
    ///
    /// Returns `None` when `CLANG_FORMAT_URL`/`CLANG_FORMAT_SHA256` are not
    /// both set; callers are expected to skip the stage in that case.
    pub fn clang_format_from_env() -> Option<Self> {
        let url = std::env::var("CLANG_FORMAT_URL").ok()?;
        let sha256 = std::env::var("CLANG_FORMAT_SHA256").ok()?;
        Some(Self {
            name: "clang-format".to_string(),
            url,
            sha256: sha256.to_lowercase(),
        })
    }
}

/// Compute the SHA-256 hash of a file as a hex string.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Check a cached binary against its pinned digest.
///
/// Returns `Ok(true)` when the file exists and matches, `Ok(false)` when it
/// does not exist. A file that exists but does not match is deleted and the
/// mismatch reported as an error: do not execute it.
pub fn verify_or_remove(path: &Path, expected_sha256: &str) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let actual = file_sha256(path)?;
    if actual == expected_sha256 {
        return Ok(true);
    }

    warn!(
        path = %path.display(),
        expected = expected_sha256,
        actual = %actual,
        "binary does not match its pinned digest, deleting"
    );
    std::fs::remove_file(path)?;

    Err(ToolchainError::DigestMismatch {
        tool: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        expected: expected_sha256.to_string(),
        actual,
    })
}

/// Ensure a pinned tool is present in `cache_dir`, downloading it if needed.
///
/// Returns the path of the verified, executable binary.
pub async fn ensure_tool(tool: &PinnedTool, cache_dir: &Path) -> Result<PathBuf> {
    let dest = cache_dir.join(&tool.name);

    if verify_or_remove(&dest, &tool.sha256)? {
        debug!(tool = %tool.name, path = %dest.display(), "using cached binary");
        return Ok(dest);
    }

    std::fs::create_dir_all(cache_dir)?;

    info!(tool = %tool.name, url = %tool.url, "downloading pinned binary");
    let response = reqwest::get(&tool.url).await?;
    if !response.status().is_success() {
        return Err(ToolchainError::Download(format!(
            "{} returned HTTP {}",
            tool.url,
            response.status()
        )));
    }
    let bytes = response.bytes().await?;
    std::fs::write(&dest, &bytes)?;

    // Deletes the download and errors on mismatch
    verify_or_remove(&dest, &tool.sha256)?;
    make_executable(&dest)?;

    info!(tool = %tool.name, path = %dest.display(), "pinned binary verified");
    Ok(dest)
}

fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
