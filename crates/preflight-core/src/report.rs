//! Run reporting: stage events and the JSON run artifact.
//!
//! Every stage produces a `stage_called` event when it starts and a
//! `stage_returned` or `stage_failed` event when it completes. The gate
//! evaluates these events; `--report` writes them to disk as pretty JSON.

use crate::error::Result;
use crate::runner::StageResult;
use crate::stage::StageConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use uuid::Uuid;

/// Kind of a recorded stage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageEventKind {
    StageCalled,
    StageReturned,
    StageFailed,
}

/// One recorded event in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub seq: u64,
    pub kind: StageEventKind,
    pub stage: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Final run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_events: u64,
    pub duration_ms: u64,
    pub success: bool,
}

/// The full record of one run, serializable as a report artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run ID (UUIDv4).
    pub run_id: String,

    /// Digest of the executed plan's ordered stage names.
    pub plan_digest: String,

    /// Toolchain fingerprint, when one could be computed.
    pub toolchain_fingerprint: Option<String>,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// Recorded events in sequence order.
    pub events: Vec<StageEvent>,

    /// Set once the run is finished.
    pub summary: Option<RunSummary>,
}

impl RunReport {
    /// Start a new report for a plan.
    pub fn new(plan_digest: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            plan_digest: plan_digest.to_string(),
            toolchain_fingerprint: None,
            started_at: Utc::now(),
            events: Vec::new(),
            summary: None,
        }
    }

    fn push(&mut self, kind: StageEventKind, stage: &str, payload: serde_json::Value) {
        let seq = self.events.len() as u64 + 1;
        self.events.push(StageEvent {
            seq,
            kind,
            stage: stage.to_string(),
            payload,
            timestamp: Utc::now(),
        });
    }

    /// Record that a stage started.
    pub fn record_called(&mut self, config: &StageConfig) {
        self.push(
            StageEventKind::StageCalled,
            &config.name,
            json!({
                "command": &config.command,
                "timeout_secs": config.timeout_secs,
            }),
        );
    }

    /// Record a completed stage, pass or fail.
    pub fn record_result(&mut self, result: &StageResult) {
        let kind = if result.passed() {
            StageEventKind::StageReturned
        } else {
            StageEventKind::StageFailed
        };
        let mut payload = json!({
            "exit_code": result.exit_code,
            "stdout": &result.stdout,
            "stderr": &result.stderr,
            "duration_ms": result.duration_ms,
        });
        if !result.passed() {
            payload["error"] = json!(format!(
                "stage '{}' exited with code {}",
                result.stage_name, result.exit_code
            ));
        }
        self.push(kind, &result.stage_name, payload);
    }

    /// Record a stage whose execution itself failed (spawn error, timeout).
    pub fn record_execution_error(&mut self, stage: &str, error: &str, duration_ms: u64) {
        self.push(
            StageEventKind::StageFailed,
            stage,
            json!({
                "exit_code": -1,
                "stdout": "",
                "stderr": error,
                "duration_ms": duration_ms,
                "error": format!("stage '{}' execution error: {}", stage, error),
            }),
        );
    }

    /// Finalize the report.
    pub fn finish(&mut self, duration_ms: u64, success: bool) {
        self.summary = Some(RunSummary {
            total_events: self.events.len() as u64,
            duration_ms,
            success,
        });
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let rendered = serde_json::to_string_pretty(self)?;
        std::fs::write(path, rendered)?;
        Ok(())
    }
}
