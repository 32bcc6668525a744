//! Toolchain fingerprinting.
//!
//! A run report records which toolchain produced it. The fingerprint is a
//! SHA-256 over the verbose rustc version banner plus the workspace's
//! `Cargo.lock` (pinned dependencies affect what the checkers see).

use crate::error::{Result, ToolchainError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Toolchain fingerprint hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainFingerprint {
    pub hash: String,
}

impl ToolchainFingerprint {
    /// Shortened form for display.
    pub fn short(&self) -> &str {
        &self.hash[..12.min(self.hash.len())]
    }
}

impl std::fmt::Display for ToolchainFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Generate the fingerprint for a workspace.
pub fn toolchain_fingerprint(workspace: &Path) -> Result<ToolchainFingerprint> {
    let output = Command::new("rustc")
        .args(["--version", "--verbose"])
        .output()
        .map_err(|_| ToolchainError::ToolNotFound("rustc".to_string()))?;

    if !output.status.success() {
        return Err(ToolchainError::CommandFailed(
            "rustc --version --verbose".to_string(),
        ));
    }

    let mut hasher = Sha256::new();
    hasher.update(&output.stdout);

    let lock_path = workspace.join("Cargo.lock");
    if lock_path.exists() {
        hasher.update(b"Cargo.lock:");
        hasher.update(&std::fs::read(&lock_path)?);
    }

    let hash = hex::encode(hasher.finalize());
    debug!(fingerprint = %&hash[..12], "toolchain fingerprint");
    Ok(ToolchainFingerprint { hash })
}
