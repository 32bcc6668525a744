//! Gate evaluation for pass/fail criteria.

use crate::report::{StageEvent, StageEventKind};
use serde::{Deserialize, Serialize};

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// Violations that caused failure (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Gate evaluation rules.
pub struct Gate;

impl Gate {
    /// Evaluate whether every started stage completed successfully.
    ///
    /// Gate rule:
    /// - For each `stage_called` event there must be a matching
    ///   `stage_returned` event with exit_code == 0
    /// - Any `stage_failed` event, non-zero exit code, or stage that never
    ///   completed is a violation
    pub fn evaluate(events: &[StageEvent]) -> GateVerdict {
        let mut violations = Vec::new();

        let mut stages_called = std::collections::HashSet::new();
        let mut stages_completed = std::collections::HashSet::new();

        for event in events {
            match event.kind {
                StageEventKind::StageCalled => {
                    stages_called.insert(event.stage.clone());
                }
                StageEventKind::StageReturned => {
                    let exit_code = event.payload["exit_code"].as_i64().unwrap_or(-1);
                    if exit_code == 0 {
                        stages_completed.insert(event.stage.clone());
                    } else {
                        violations.push(format!(
                            "stage '{}' returned non-zero exit code: {}",
                            event.stage, exit_code
                        ));
                    }
                }
                StageEventKind::StageFailed => {
                    let error = event.payload["error"].as_str().unwrap_or("unknown error");
                    violations.push(format!("stage '{}' failed: {}", event.stage, error));
                }
            }
        }

        // Stages that were started but never completed successfully
        for stage in &stages_called {
            if !stages_completed.contains(stage)
                && !violations.iter().any(|v| v.contains(stage.as_str()))
            {
                violations.push(format!("stage '{}' was started but never completed", stage));
            }
        }

        let passed = violations.is_empty();
        let message = if passed {
            "all stages passed".to_string()
        } else {
            format!("gate failed with {} violation(s)", violations.len())
        };

        GateVerdict {
            passed,
            violations,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn event(seq: u64, kind: StageEventKind, stage: &str, payload: serde_json::Value) -> StageEvent {
        StageEvent {
            seq,
            kind,
            stage: stage.to_string(),
            payload,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_events_passes() {
        let verdict = Gate::evaluate(&[]);
        assert!(verdict.passed);
    }

    #[test]
    fn test_single_successful_stage() {
        let events = vec![
            event(1, StageEventKind::StageCalled, "fmt", json!({})),
            event(
                2,
                StageEventKind::StageReturned,
                "fmt",
                json!({ "exit_code": 0 }),
            ),
        ];

        let verdict = Gate::evaluate(&events);
        assert!(verdict.passed);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn test_single_failed_stage() {
        let events = vec![
            event(1, StageEventKind::StageCalled, "check", json!({})),
            event(
                2,
                StageEventKind::StageFailed,
                "check",
                json!({ "error": "build failed" }),
            ),
        ];

        let verdict = Gate::evaluate(&events);
        assert!(!verdict.passed);
        assert!(!verdict.violations.is_empty());
    }

    #[test]
    fn test_multiple_stages_with_failure() {
        let events = vec![
            event(1, StageEventKind::StageCalled, "fmt", json!({})),
            event(
                2,
                StageEventKind::StageReturned,
                "fmt",
                json!({ "exit_code": 0 }),
            ),
            event(3, StageEventKind::StageCalled, "check", json!({})),
            event(
                4,
                StageEventKind::StageReturned,
                "check",
                json!({ "exit_code": 1 }),
            ),
        ];

        let verdict = Gate::evaluate(&events);
        assert!(!verdict.passed);
        assert_eq!(verdict.violations.len(), 1);
    }

    #[test]
    fn test_stage_called_but_never_completed() {
        let events = vec![event(1, StageEventKind::StageCalled, "fmt", json!({}))];

        let verdict = Gate::evaluate(&events);
        assert!(!verdict.passed);
        assert_eq!(verdict.violations.len(), 1);
        assert!(verdict.violations[0].contains("never completed"));
    }

    #[test]
    fn test_non_zero_exit_code() {
        let events = vec![
            event(1, StageEventKind::StageCalled, "test", json!({})),
            event(
                2,
                StageEventKind::StageReturned,
                "test",
                json!({ "exit_code": 127 }),
            ),
        ];

        let verdict = Gate::evaluate(&events);
        assert!(!verdict.passed);
        assert!(verdict.violations[0].contains("127"));
    }
}
