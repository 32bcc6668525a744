//! Plan construction: the flag set becomes an ordered stage list.
//!
//! `Plan::build` is a pure function so that "given flag combination X, the
//! correct tool invocations occur in the correct order" can be tested
//! without running any external tool.

use crate::stage::{BuiltinStage, StageConfig};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Flag set distilled from the command line.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Workspace root the stages run in.
    pub workspace: PathBuf,

    /// Run the test invocation under coverage instrumentation and print a
    /// coverage report at the end.
    pub coverage: bool,

    /// Reduced run: set QUICKTEST=1 for the test harness and skip the
    /// network/coverage stages.
    pub quick: bool,

    /// Append the network integration test stage.
    pub net: bool,

    /// Run formatters in rewrite mode instead of check mode, then stop.
    pub autofix: bool,

    /// Shorthand for all static checkers (fmt, clang-format, clippy, check).
    pub codeformat: bool,

    /// Individual checker selectors.
    pub fmt: bool,
    pub clang_format: bool,
    pub clippy: bool,
    pub check: bool,

    /// Force the build+test stages even when checkers are selected.
    pub unit: bool,

    /// Parallel jobs forwarded to cargo.
    pub jobs: Option<u16>,
}

impl PlanOptions {
    fn want_fmt(&self) -> bool {
        self.fmt || self.codeformat
    }

    fn want_clang_format(&self) -> bool {
        self.clang_format || self.codeformat
    }

    fn want_clippy(&self) -> bool {
        self.clippy || self.codeformat
    }

    fn want_check(&self) -> bool {
        self.check || self.codeformat
    }

    /// Whether any static checker was explicitly selected.
    pub fn checkers_selected(&self) -> bool {
        self.want_fmt() || self.want_clang_format() || self.want_clippy() || self.want_check()
    }
}

/// Ordered list of stages for one run.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Workspace root path.
    pub workspace: PathBuf,

    /// Stages in execution order.
    pub stages: Vec<StageConfig>,

    /// SHA-256 digest of the ordered stage names (deterministic).
    pub digest: String,
}

impl Plan {
    /// Build the stage plan for a flag set.
    ///
    /// Ordering rules:
    /// - autofix: rewrite-mode formatters only, nothing else
    /// - selected checkers run first, in catalogue order
    /// - build precedes the test invocation
    /// - quick suppresses the network and coverage stages
    /// - the coverage report always comes last
    pub fn build(opts: &PlanOptions) -> Self {
        let mut stages = Vec::new();

        if opts.autofix {
            // Bare --autofix means "fix the Rust formatting"; native sources
            // are only rewritten when their checker was selected too.
            if opts.want_fmt() || !opts.checkers_selected() {
                if let Some(fix) = StageConfig::from_builtin(BuiltinStage::Fmt).into_fix() {
                    stages.push(fix);
                }
            }
            if opts.want_clang_format() {
                if let Some(fix) = StageConfig::from_builtin(BuiltinStage::ClangFormat).into_fix()
                {
                    stages.push(fix);
                }
            }
            return Self::from_stages(opts.workspace.clone(), stages);
        }

        if opts.want_fmt() {
            stages.push(StageConfig::from_builtin(BuiltinStage::Fmt));
        }
        if opts.want_clang_format() {
            stages.push(StageConfig::from_builtin(BuiltinStage::ClangFormat));
        }
        if opts.want_clippy() {
            stages.push(StageConfig::from_builtin(BuiltinStage::Clippy));
        }
        if opts.want_check() {
            stages.push(StageConfig::from_builtin(BuiltinStage::Check));
        }

        let run_tests = !opts.checkers_selected() || opts.unit;
        if run_tests {
            stages.push(with_jobs(
                StageConfig::from_builtin(BuiltinStage::Build),
                opts.jobs,
            ));

            let coverage = opts.coverage && !opts.quick;
            let test_stage = if coverage {
                BuiltinStage::Coverage
            } else {
                BuiltinStage::Test
            };
            let mut test = with_jobs(StageConfig::from_builtin(test_stage), opts.jobs);
            if opts.quick {
                test = test.with_env("QUICKTEST", "1");
            }
            stages.push(test);

            if opts.net && !opts.quick {
                stages.push(with_jobs(
                    StageConfig::from_builtin(BuiltinStage::NetTest),
                    opts.jobs,
                ));
            }
            if coverage {
                stages.push(StageConfig::from_builtin(BuiltinStage::CoverageReport));
            }
        }

        Self::from_stages(opts.workspace.clone(), stages)
    }

    fn from_stages(workspace: PathBuf, stages: Vec<StageConfig>) -> Self {
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        let digest = compute_stages_digest(&names);
        Self {
            workspace,
            stages,
            digest,
        }
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Whether the plan contains no stages at all.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Insert `--jobs N` into a cargo command line, before any `--` separator so
/// the flag reaches cargo rather than the test binary.
fn with_jobs(mut config: StageConfig, jobs: Option<u16>) -> StageConfig {
    let Some(n) = jobs else {
        return config;
    };
    let jobs_args = ["--jobs".to_string(), n.to_string()];
    match config.command.iter().position(|a| a == "--") {
        Some(idx) => {
            config.command.splice(idx..idx, jobs_args);
        }
        None => config.command.extend(jobs_args),
    }
    config
}

/// Compute deterministic digest of ordered stage names.
fn compute_stages_digest(stages: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for stage in stages {
        hasher.update(stage.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> PlanOptions {
        PlanOptions {
            workspace: PathBuf::from("."),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_plan_is_build_then_test() {
        let plan = Plan::build(&opts());
        assert_eq!(plan.stage_names(), vec!["build", "test"]);
    }

    #[test]
    fn test_codeformat_selects_all_checkers_and_skips_tests() {
        let plan = Plan::build(&PlanOptions {
            codeformat: true,
            ..opts()
        });
        assert_eq!(
            plan.stage_names(),
            vec!["fmt", "clang_format", "clippy", "check"]
        );
    }

    #[test]
    fn test_single_checker_runs_alone() {
        let plan = Plan::build(&PlanOptions {
            clippy: true,
            ..opts()
        });
        assert_eq!(plan.stage_names(), vec!["clippy"]);
    }

    #[test]
    fn test_unit_flag_restores_tests_after_checkers() {
        let plan = Plan::build(&PlanOptions {
            check: true,
            unit: true,
            ..opts()
        });
        assert_eq!(plan.stage_names(), vec!["check", "build", "test"]);
    }

    #[test]
    fn test_coverage_replaces_test_and_appends_report() {
        let plan = Plan::build(&PlanOptions {
            coverage: true,
            ..opts()
        });
        assert_eq!(
            plan.stage_names(),
            vec!["build", "coverage", "coverage_report"]
        );
    }

    #[test]
    fn test_net_stage_runs_after_tests_before_report() {
        let plan = Plan::build(&PlanOptions {
            coverage: true,
            net: true,
            ..opts()
        });
        assert_eq!(
            plan.stage_names(),
            vec!["build", "coverage", "net_test", "coverage_report"]
        );
    }

    #[test]
    fn test_quick_sets_harness_env_and_suppresses_net_and_coverage() {
        let plan = Plan::build(&PlanOptions {
            quick: true,
            net: true,
            coverage: true,
            ..opts()
        });
        assert_eq!(plan.stage_names(), vec!["build", "test"]);

        let test = &plan.stages[1];
        assert!(test
            .env
            .contains(&("QUICKTEST".to_string(), "1".to_string())));
    }

    #[test]
    fn test_autofix_runs_formatters_in_rewrite_mode_only() {
        let plan = Plan::build(&PlanOptions {
            autofix: true,
            ..opts()
        });
        assert_eq!(plan.stage_names(), vec!["fmt_fix"]);
        assert_eq!(plan.stages[0].command, vec!["cargo", "fmt", "--all"]);
    }

    #[test]
    fn test_autofix_with_codeformat_rewrites_native_sources_too() {
        let plan = Plan::build(&PlanOptions {
            autofix: true,
            codeformat: true,
            ..opts()
        });
        assert_eq!(plan.stage_names(), vec!["fmt_fix", "clang_format_fix"]);
    }

    #[test]
    fn test_jobs_forwarded_to_cargo_before_separator() {
        let plan = Plan::build(&PlanOptions {
            net: true,
            jobs: Some(4),
            ..opts()
        });

        let build = &plan.stages[0];
        assert_eq!(
            build.command,
            vec!["cargo", "build", "--workspace", "--jobs", "4"]
        );

        // --jobs must land before `--` so it reaches cargo, not the harness
        let net = plan.stages.iter().find(|s| s.name == "net_test").unwrap();
        assert_eq!(
            net.command,
            vec!["cargo", "test", "--workspace", "--jobs", "4", "--", "--ignored"]
        );
    }

    #[test]
    fn test_stages_digest_deterministic() {
        let plan1 = Plan::build(&opts());
        let plan2 = Plan::build(&opts());
        assert_eq!(plan1.digest, plan2.digest);
    }

    #[test]
    fn test_stages_digest_order_sensitive() {
        let digest1 = compute_stages_digest(&["fmt", "check"]);
        let digest2 = compute_stages_digest(&["check", "fmt"]);
        assert_ne!(digest1, digest2);
    }

    #[test]
    fn test_digest_changes_with_selection() {
        let default_plan = Plan::build(&opts());
        let coverage_plan = Plan::build(&PlanOptions {
            coverage: true,
            ..opts()
        });
        assert_ne!(default_plan.digest, coverage_plan.digest);
    }
}
