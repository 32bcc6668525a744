//! Sequential pipeline orchestration over a stage plan.

use crate::error::Result;
use crate::plan::Plan;
use crate::report::RunReport;
use crate::runner::{StageResult, StageRunner};
use std::time::Instant;
use tracing::{info, warn};

/// Result of a complete pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Run ID from the report.
    pub run_id: String,

    /// Whether all executed stages passed.
    pub success: bool,

    /// Results of individual stages, in execution order.
    pub stages: Vec<StageResult>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    /// Digest of the executed plan.
    pub plan_digest: String,
}

impl PipelineOutcome {
    /// Number of stages that passed.
    pub fn passed_count(&self) -> usize {
        self.stages.iter().filter(|s| s.passed()).count()
    }

    /// Number of stages that failed.
    pub fn failed_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.passed()).count()
    }

    /// The first failing stage, if any.
    pub fn first_failure(&self) -> Option<&StageResult> {
        self.stages.iter().find(|s| !s.passed())
    }
}

/// Pipeline orchestrator.
pub struct Pipeline;

impl Pipeline {
    /// Execute a plan's enabled stages in order.
    ///
    /// Each stage produces a `stage_called` event on start and a
    /// `stage_returned`/`stage_failed` event on completion. With
    /// `keep_going = false` the pipeline stops at the first failure,
    /// matching the propagate-first-failure behavior of the CLI; with
    /// `keep_going = true` every stage runs and all failures are reported.
    pub async fn run(
        plan: &Plan,
        runner: &StageRunner,
        keep_going: bool,
    ) -> Result<(PipelineOutcome, RunReport)> {
        let start = Instant::now();
        let mut report = RunReport::new(&plan.digest);

        info!(run_id = %report.run_id, stages = plan.stages.len(), "starting check run");

        let mut stage_results = Vec::new();
        let mut all_passed = true;

        for config in &plan.stages {
            if !config.enabled {
                info!(stage = %config.name, "skipping disabled stage");
                continue;
            }

            info!(stage = %config.name, command = %config.rendered(), "executing stage");
            report.record_called(config);

            // Execution errors (spawn failure, timeout) become failed
            // results so the gate sees them.
            let result = match runner.execute(config).await {
                Ok(result) => {
                    report.record_result(&result);
                    result
                }
                Err(e) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    report.record_execution_error(&config.name, &e.to_string(), duration_ms);
                    StageResult {
                        stage_name: config.name.clone(),
                        exit_code: -1,
                        stdout: String::new(),
                        stderr: e.to_string(),
                        duration_ms,
                        success: false,
                    }
                }
            };

            if result.passed() {
                stage_results.push(result);
                continue;
            }

            all_passed = false;
            warn!(
                stage = %result.stage_name,
                exit_code = result.exit_code,
                "stage failed"
            );
            stage_results.push(result);

            if !keep_going {
                break;
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        report.finish(duration_ms, all_passed);

        if all_passed {
            info!(run_id = %report.run_id, duration_ms, "check run completed successfully");
        } else {
            info!(run_id = %report.run_id, duration_ms, "check run failed");
        }

        let outcome = PipelineOutcome {
            run_id: report.run_id.clone(),
            success: all_passed,
            stages: stage_results,
            duration_ms,
            plan_digest: plan.digest.clone(),
        };

        Ok((outcome, report))
    }
}
