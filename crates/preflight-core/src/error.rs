//! Error types for preflight-core

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while planning or executing a check run
#[derive(Error, Debug)]
pub enum PreflightError {
    /// A stage was configured without a command
    #[error("stage '{0}' has an empty command")]
    EmptyCommand(String),

    /// Stage command could not be spawned
    #[error("failed to spawn stage '{stage}': {source}")]
    Spawn {
        stage: String,
        #[source]
        source: std::io::Error,
    },

    /// Stage exceeded its timeout
    #[error("stage '{stage}' timed out after {timeout_secs} seconds")]
    Timeout { stage: String, timeout_secs: u64 },

    /// Workspace root does not exist or is not a directory
    #[error("workspace root not found: {}", .0.display())]
    WorkspaceNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PreflightError>;
