//! Check stage definitions and configuration.

use serde::{Deserialize, Serialize};

fn to_argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Builtin check stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinStage {
    /// cargo build --workspace (compiles the native-extension crates)
    Build,

    /// cargo fmt --all -- --check
    Fmt,

    /// clang-format --dry-run --Werror over native C/CUDA sources
    ClangFormat,

    /// cargo clippy --workspace --all-targets -- -D warnings
    Clippy,

    /// cargo check --workspace
    Check,

    /// cargo test --workspace
    Test,

    /// cargo test --workspace -- --ignored (network/slow integration tests)
    NetTest,

    /// cargo llvm-cov --workspace --no-report (instrumented test run)
    Coverage,

    /// cargo llvm-cov report
    CoverageReport,
}

impl BuiltinStage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinStage::Build => "build",
            BuiltinStage::Fmt => "fmt",
            BuiltinStage::ClangFormat => "clang_format",
            BuiltinStage::Clippy => "clippy",
            BuiltinStage::Check => "check",
            BuiltinStage::Test => "test",
            BuiltinStage::NetTest => "net_test",
            BuiltinStage::Coverage => "coverage",
            BuiltinStage::CoverageReport => "coverage_report",
        }
    }

    /// Get the stage's main command.
    pub fn command(&self) -> Vec<String> {
        match self {
            BuiltinStage::Build => to_argv(&["cargo", "build", "--workspace"]),
            BuiltinStage::Fmt => to_argv(&["cargo", "fmt", "--all", "--", "--check"]),
            BuiltinStage::ClangFormat => to_argv(&["clang-format", "--dry-run", "--Werror"]),
            BuiltinStage::Clippy => to_argv(&[
                "cargo",
                "clippy",
                "--workspace",
                "--all-targets",
                "--",
                "-D",
                "warnings",
            ]),
            BuiltinStage::Check => to_argv(&["cargo", "check", "--workspace"]),
            BuiltinStage::Test => to_argv(&["cargo", "test", "--workspace"]),
            BuiltinStage::NetTest => {
                to_argv(&["cargo", "test", "--workspace", "--", "--ignored"])
            }
            BuiltinStage::Coverage => {
                to_argv(&["cargo", "llvm-cov", "--workspace", "--no-report"])
            }
            BuiltinStage::CoverageReport => to_argv(&["cargo", "llvm-cov", "report"]),
        }
    }

    /// Get the stage's rewrite command (if the tool can fix what it checks).
    pub fn fix_command(&self) -> Option<Vec<String>> {
        match self {
            BuiltinStage::Fmt => Some(to_argv(&["cargo", "fmt", "--all"])),
            BuiltinStage::ClangFormat => Some(to_argv(&["clang-format", "-i"])),
            _ => None,
        }
    }

    /// Default timeout for this stage, in seconds.
    pub fn default_timeout_secs(&self) -> u64 {
        match self {
            BuiltinStage::Build => 1800,
            BuiltinStage::Fmt | BuiltinStage::ClangFormat => 300,
            BuiltinStage::Clippy | BuiltinStage::Check => 900,
            BuiltinStage::Test => 1800,
            BuiltinStage::NetTest => 3600,
            BuiltinStage::Coverage => 2400,
            BuiltinStage::CoverageReport => 300,
        }
    }
}

/// Configuration for a single check stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Human-readable stage name.
    pub name: String,

    /// Command to execute (first element is the executable).
    pub command: Vec<String>,

    /// Optional rewrite command.
    pub fix_command: Option<Vec<String>>,

    /// Extra environment for the child process.
    pub env: Vec<(String, String)>,

    /// Timeout in seconds (0 = no timeout).
    pub timeout_secs: u64,

    /// Whether this stage is enabled.
    pub enabled: bool,
}

impl StageConfig {
    /// Create a stage configuration from a builtin stage.
    pub fn from_builtin(stage: BuiltinStage) -> Self {
        Self {
            name: stage.name().to_string(),
            command: stage.command(),
            fix_command: stage.fix_command(),
            env: Vec::new(),
            timeout_secs: stage.default_timeout_secs(),
            enabled: true,
        }
    }

    /// Create a custom stage configuration.
    pub fn custom(name: String, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name,
            command,
            fix_command: None,
            env: Vec::new(),
            timeout_secs,
            enabled: true,
        }
    }

    /// Switch the stage to its rewrite command. Returns `None` when the
    /// underlying tool has no fix mode.
    pub fn into_fix(self) -> Option<Self> {
        let fix = self.fix_command.clone()?;
        Some(Self {
            name: format!("{}_fix", self.name),
            command: fix,
            fix_command: None,
            ..self
        })
    }

    /// Append extra arguments to the command line.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a child-environment variable.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Disable this stage.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Render the invocation as a single display line, env prefix included.
    pub fn rendered(&self) -> String {
        let mut parts: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        parts.extend(self.command.iter().map(|arg| {
            if arg.chars().any(char::is_whitespace) {
                format!("'{}'", arg)
            } else {
                arg.clone()
            }
        }));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_stage_names() {
        assert_eq!(BuiltinStage::Build.name(), "build");
        assert_eq!(BuiltinStage::Fmt.name(), "fmt");
        assert_eq!(BuiltinStage::ClangFormat.name(), "clang_format");
        assert_eq!(BuiltinStage::Clippy.name(), "clippy");
        assert_eq!(BuiltinStage::Check.name(), "check");
        assert_eq!(BuiltinStage::Test.name(), "test");
        assert_eq!(BuiltinStage::NetTest.name(), "net_test");
        assert_eq!(BuiltinStage::Coverage.name(), "coverage");
        assert_eq!(BuiltinStage::CoverageReport.name(), "coverage_report");
    }

    #[test]
    fn test_builtin_stage_commands() {
        let fmt_cmd = BuiltinStage::Fmt.command();
        assert_eq!(fmt_cmd[0], "cargo");
        assert!(fmt_cmd.contains(&"--check".to_string()));

        let test_cmd = BuiltinStage::Test.command();
        assert_eq!(test_cmd[0], "cargo");
        assert!(test_cmd.contains(&"test".to_string()));

        let net_cmd = BuiltinStage::NetTest.command();
        assert!(net_cmd.contains(&"--ignored".to_string()));
    }

    #[test]
    fn test_builtin_stage_fix_command() {
        assert!(BuiltinStage::Fmt.fix_command().is_some());
        assert!(BuiltinStage::ClangFormat.fix_command().is_some());
        assert!(BuiltinStage::Clippy.fix_command().is_none());
        assert!(BuiltinStage::Test.fix_command().is_none());
    }

    #[test]
    fn test_stage_config_from_builtin() {
        let config = StageConfig::from_builtin(BuiltinStage::Check);
        assert_eq!(config.name, "check");
        assert_eq!(config.timeout_secs, 900);
        assert!(config.enabled);
        assert!(config.env.is_empty());
    }

    #[test]
    fn test_stage_config_custom() {
        let config = StageConfig::custom(
            "my_stage".to_string(),
            vec!["echo".to_string(), "hello".to_string()],
            60,
        );
        assert_eq!(config.name, "my_stage");
        assert_eq!(config.timeout_secs, 60);
        assert!(config.enabled);
        assert!(config.fix_command.is_none());
    }

    #[test]
    fn test_stage_config_into_fix() {
        let fix = StageConfig::from_builtin(BuiltinStage::Fmt)
            .into_fix()
            .expect("fmt has a fix command");
        assert_eq!(fix.name, "fmt_fix");
        assert_eq!(fix.command, vec!["cargo", "fmt", "--all"]);
        assert!(fix.fix_command.is_none());

        assert!(StageConfig::from_builtin(BuiltinStage::Clippy)
            .into_fix()
            .is_none());
    }

    #[test]
    fn test_stage_config_disabled() {
        let config = StageConfig::from_builtin(BuiltinStage::Check).disabled();
        assert!(!config.enabled);
    }

    #[test]
    fn test_rendered_includes_env_prefix() {
        let config = StageConfig::from_builtin(BuiltinStage::Test).with_env("QUICKTEST", "1");
        let line = config.rendered();
        assert!(line.starts_with("QUICKTEST=1 cargo test"));
    }

    #[test]
    fn test_rendered_quotes_whitespace_args() {
        let config = StageConfig::custom(
            "echo".to_string(),
            vec!["echo".to_string(), "two words".to_string()],
            10,
        );
        assert_eq!(config.rendered(), "echo 'two words'");
    }

    #[test]
    fn test_with_args_appends() {
        let config = StageConfig::from_builtin(BuiltinStage::Build).with_args(["--jobs", "4"]);
        assert_eq!(
            config.command,
            vec!["cargo", "build", "--workspace", "--jobs", "4"]
        );
    }
}
