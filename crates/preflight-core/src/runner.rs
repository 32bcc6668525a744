//! Stage execution: one child process per stage, with timeout.

use crate::error::{PreflightError, Result};
use crate::stage::StageConfig;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Result of a stage execution.
#[derive(Debug, Clone)]
pub struct StageResult {
    /// Stage name.
    pub stage_name: String,

    /// Exit code (0 = success, -1 = spawn error or timeout).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether execution succeeded.
    pub success: bool,
}

impl StageResult {
    /// Whether this stage passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }
}

/// Executes stage commands inside a workspace root.
#[derive(Debug, Clone)]
pub struct StageRunner {
    /// Directory the child processes run in.
    pub workspace: PathBuf,
}

impl StageRunner {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }

    /// Execute a single stage and return its result.
    ///
    /// Spawn failures and timeouts are errors; a tool that runs and exits
    /// non-zero is a normal (failed) `StageResult`.
    pub async fn execute(&self, config: &StageConfig) -> Result<StageResult> {
        let start = Instant::now();

        if config.command.is_empty() {
            return Err(PreflightError::EmptyCommand(config.name.clone()));
        }

        let exe = &config.command[0];
        let args = &config.command[1..];

        let child = Command::new(exe)
            .args(args)
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.workspace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PreflightError::Spawn {
                stage: config.name.clone(),
                source: e,
            })?;

        let output = if config.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| PreflightError::Timeout {
                stage: config.name.clone(),
                timeout_secs: config.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        Ok(StageResult {
            stage_name: config.name.clone(),
            exit_code,
            stdout,
            stderr,
            duration_ms,
            success: output.status.success(),
        })
    }
}
