//! Error types for preflight-toolchain

use thiserror::Error;

/// Errors that can occur in the toolchain layer
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// Cargo not found
    #[error("cargo is not installed or not in PATH")]
    CargoNotFound,

    /// A required external tool is missing
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// External command execution failed
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// Installed toolchain is older than the minimum
    #[error("rust toolchain {found} is older than the required {required}")]
    ToolchainTooOld { found: String, required: String },

    /// Could not parse a tool's version output
    #[error("unparseable version output: {0}")]
    VersionParse(String),

    /// Downloaded or cached binary does not match its pinned digest
    #[error("digest mismatch for {tool}: expected {expected}, got {actual}")]
    DigestMismatch {
        tool: String,
        expected: String,
        actual: String,
    },

    /// Download failed
    #[error("download failed: {0}")]
    Download(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ToolchainError {
    fn from(err: reqwest::Error) -> Self {
        ToolchainError::Download(err.to_string())
    }
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ToolchainError>;
