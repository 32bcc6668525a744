//! preflight - developer pre-merge checks for Cargo workspaces.
//!
//! Compiles the workspace, runs the selected style/lint/type checkers, and
//! drives the unit/integration test invocations in a fixed order gated by
//! flags.
//!
//! ## Typical invocations
//!
//! - `preflight` — build + unit tests
//! - `preflight --quick` — reduced unit-test run
//! - `preflight --codeformat` — all static checkers, no tests
//! - `preflight --autofix` — rewrite formatting in place
//! - `preflight --coverage --net` — instrumented tests plus the network suite
//! - `preflight --dry-run ...` — print the commands instead of running them

use anyhow::{Context, Result};
use clap::Parser;
use preflight_core::{
    clean_workspace, init_tracing, Gate, Pipeline, PipelineOutcome, Plan, PlanOptions,
    StageRunner,
};
use preflight_toolchain::{
    collect_native_sources, ensure_tool, is_tool_available, require_cargo,
    toolchain_fingerprint, PinnedTool,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "preflight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Developer pre-merge checks: build, lint, type-check, test", long_about = None)]
struct Cli {
    /// Workspace root to operate on
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Run the test invocation under coverage instrumentation
    #[arg(long)]
    coverage: bool,

    /// Reduced test run that skips long-running tests
    #[arg(long, env = "QUICKTEST", value_parser = clap::builder::FalseyValueParser::new())]
    quick: bool,

    /// Also run the network integration test suite
    #[arg(long)]
    net: bool,

    /// Print the commands that would run, without executing them
    #[arg(long, alias = "dryrun")]
    dry_run: bool,

    /// Run all static checkers (fmt, clang-format, clippy, check)
    #[arg(long)]
    codeformat: bool,

    /// Rewrite formatting in place instead of checking it
    #[arg(long)]
    autofix: bool,

    /// Run the Rust formatting check
    #[arg(long)]
    fmt: bool,

    /// Run the native-source formatting check
    #[arg(long)]
    clangformat: bool,

    /// Run the lint check
    #[arg(long)]
    clippy: bool,

    /// Run the type check
    #[arg(long)]
    check: bool,

    /// Run build + unit tests even when checkers are selected
    #[arg(long)]
    unit: bool,

    /// Remove run artifacts (coverage output, tool cache) and exit
    #[arg(long)]
    clean: bool,

    /// Also remove the target/ directory when cleaning
    #[arg(long, requires = "clean")]
    deep: bool,

    /// Number of parallel jobs forwarded to cargo
    #[arg(short, long)]
    jobs: Option<u16>,

    /// Run every stage even after a failure
    #[arg(long)]
    keep_going: bool,

    /// Write the JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    if cli.clean {
        return cmd_clean(&cli.workspace, cli.deep);
    }

    let opts = PlanOptions {
        workspace: cli.workspace.clone(),
        coverage: cli.coverage,
        quick: cli.quick,
        net: cli.net,
        autofix: cli.autofix,
        codeformat: cli.codeformat,
        fmt: cli.fmt,
        clang_format: cli.clangformat,
        clippy: cli.clippy,
        check: cli.check,
        unit: cli.unit,
        jobs: cli.jobs,
    };
    let mut plan = Plan::build(&opts);

    if cli.dry_run {
        for stage in plan.stages.iter().filter(|s| s.enabled) {
            println!("{}", stage.rendered());
        }
        return Ok(());
    }

    require_cargo().context("preflight needs a working cargo toolchain")?;
    resolve_clang_format(&mut plan, &cli.workspace).await?;

    let runner = StageRunner::new(cli.workspace.clone());
    let (outcome, mut report) = Pipeline::run(&plan, &runner, cli.keep_going).await?;

    report.toolchain_fingerprint = toolchain_fingerprint(&cli.workspace)
        .ok()
        .map(|fp| fp.hash);

    print_outcome(&outcome);

    // Evaluate gate
    let verdict = Gate::evaluate(&report.events);
    println!(
        "Gate: {}",
        if verdict.passed {
            "✓ PASSED"
        } else {
            "✗ FAILED"
        }
    );
    if !verdict.violations.is_empty() {
        println!("Violations:");
        for violation in &verdict.violations {
            println!("  - {}", violation);
        }
    }

    if let Some(path) = &cli.report {
        report
            .write_to(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("Report: {}", path.display());
    }

    if outcome.success && verdict.passed {
        println!("\n✓ All checks passed!");
        return Ok(());
    }

    // Propagate the failing tool's exit status
    if let Some(failure) = outcome.first_failure() {
        eprintln!(
            "\nStage '{}' failed (exit code {}):",
            failure.stage_name, failure.exit_code
        );
        for line in tail_lines(&failure.stderr, 20) {
            eprintln!("  {}", line);
        }
        std::process::exit(sanitize_exit_code(failure.exit_code));
    }
    std::process::exit(1);
}

/// Remove run artifacts and exit
fn cmd_clean(workspace: &Path, deep: bool) -> Result<()> {
    let outcome = clean_workspace(workspace, deep)
        .with_context(|| format!("failed to clean {}", workspace.display()))?;

    if outcome.removed.is_empty() {
        println!("Nothing to clean.");
    } else {
        for path in &outcome.removed {
            println!("Removed {}", path.display());
        }
    }

    Ok(())
}

/// Resolve the clang-format stages against the actual machine.
///
/// The planner emits the stage with a bare `clang-format` executable and no
/// file list; here the native sources are appended and the binary is
/// resolved: PATH first, then the pinned build from deployment
/// configuration. With neither available the stage is skipped, not failed.
async fn resolve_clang_format(plan: &mut Plan, workspace: &Path) -> Result<()> {
    let wanted = plan
        .stages
        .iter()
        .any(|s| s.enabled && s.name.starts_with("clang_format"));
    if !wanted {
        return Ok(());
    }

    let sources =
        collect_native_sources(workspace).context("failed to scan for native sources")?;

    let binary = if is_tool_available("clang-format") {
        Some("clang-format".to_string())
    } else if let Some(pinned) = PinnedTool::clang_format_from_env() {
        let cache_dir = tool_cache_dir(workspace);
        let path = ensure_tool(&pinned, &cache_dir)
            .await
            .context("failed to fetch the pinned clang-format build")?;
        Some(path.to_string_lossy().to_string())
    } else {
        None
    };

    for stage in plan
        .stages
        .iter_mut()
        .filter(|s| s.name.starts_with("clang_format"))
    {
        if sources.is_empty() {
            info!(stage = %stage.name, "no native sources to format, skipping");
            stage.enabled = false;
            continue;
        }
        match &binary {
            Some(bin) => {
                stage.command[0] = bin.clone();
                stage
                    .command
                    .extend(sources.iter().map(|p| p.to_string_lossy().to_string()));
            }
            None => {
                warn!(
                    stage = %stage.name,
                    "clang-format is not on PATH and no pinned build is configured, skipping"
                );
                stage.enabled = false;
            }
        }
    }

    Ok(())
}

/// Tool cache directory, overridable for shared caches.
fn tool_cache_dir(workspace: &Path) -> PathBuf {
    std::env::var_os("PREFLIGHT_TOOL_CACHE")
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace.join(preflight_core::clean::STATE_DIR).join("tools"))
}

fn print_outcome(outcome: &PipelineOutcome) {
    println!();
    println!("Run ID: {}", outcome.run_id);
    println!(
        "Status: {}",
        if outcome.success {
            "✓ PASSED"
        } else {
            "✗ FAILED"
        }
    );
    println!("Duration: {}ms", outcome.duration_ms);
    println!();

    for stage in &outcome.stages {
        let status = if stage.passed() { "✓" } else { "✗" };
        println!(
            "  {} {} ({}ms, exit code: {})",
            status, stage.stage_name, stage.duration_ms, stage.exit_code
        );
    }

    println!();
    println!(
        "Summary: {}/{} stages passed",
        outcome.passed_count(),
        outcome.stages.len()
    );
}

/// Last `n` lines of a tool's captured output.
fn tail_lines(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}

/// Map a captured exit code onto something the process can exit with.
fn sanitize_exit_code(code: i32) -> i32 {
    if (1..=255).contains(&code) {
        code
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_lines_short_input() {
        assert_eq!(tail_lines("a\nb", 5), vec!["a", "b"]);
    }

    #[test]
    fn test_tail_lines_truncates() {
        let text = "1\n2\n3\n4";
        assert_eq!(tail_lines(text, 2), vec!["3", "4"]);
    }

    #[test]
    fn test_sanitize_exit_code() {
        assert_eq!(sanitize_exit_code(2), 2);
        assert_eq!(sanitize_exit_code(101), 101);
        assert_eq!(sanitize_exit_code(0), 1);
        assert_eq!(sanitize_exit_code(-1), 1);
        assert_eq!(sanitize_exit_code(512), 1);
    }

    #[test]
    fn test_tool_cache_dir_defaults_under_state_dir() {
        std::env::remove_var("PREFLIGHT_TOOL_CACHE");
        let dir = tool_cache_dir(Path::new("/ws"));
        assert_eq!(dir, PathBuf::from("/ws/.preflight/tools"));
    }

    #[test]
    fn test_cli_parses_flag_surface() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
