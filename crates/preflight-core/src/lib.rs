//! Preflight core - check orchestration for Cargo workspaces.
//!
//! Provides the pieces the `preflight` binary is assembled from:
//! - A catalogue of builtin check stages (build, fmt, clippy, check, test,
//!   coverage, ...) and their command lines
//! - A pure plan builder that turns the flag set into an ordered stage list
//! - A sequential runner/pipeline that executes stages as child processes
//!   and records their events
//! - Gate evaluation over a finished run and a JSON run report

pub mod clean;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod plan;
pub mod report;
pub mod runner;
pub mod stage;
pub mod telemetry;

// Re-export key types
pub use clean::{clean_workspace, CleanOutcome};
pub use error::{PreflightError, Result};
pub use gate::{Gate, GateVerdict};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use plan::{Plan, PlanOptions};
pub use report::{RunReport, RunSummary, StageEvent, StageEventKind};
pub use runner::{StageResult, StageRunner};
pub use stage::{BuiltinStage, StageConfig};
pub use telemetry::init_tracing;
