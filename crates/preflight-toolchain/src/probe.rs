//! External tool probing and minimum-toolchain checks.
//!
//! This file should run with the minimal system requirements: probing must
//! work even when nothing but a shell and (maybe) cargo are installed.

use crate::error::{Result, ToolchainError};
use std::process::{Command, Stdio};
use tracing::debug;

/// Minimum rustc version the orchestrated workspaces are expected to build
/// with.
pub const RUSTC_REQUIRED_MAJOR: u32 = 1;
pub const RUSTC_REQUIRED_MINOR: u32 = 74;

/// Check whether a tool responds to `--version`.
pub fn is_tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// First line of a tool's `--version` output.
pub fn tool_version(tool: &str) -> Result<String> {
    let output = Command::new(tool)
        .arg("--version")
        .output()
        .map_err(|_| ToolchainError::ToolNotFound(tool.to_string()))?;

    if !output.status.success() {
        return Err(ToolchainError::CommandFailed(format!("{} --version", tool)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

/// Whether the installed rustc satisfies the minimum version.
pub fn rustc_version_ok() -> Result<bool> {
    let version = tool_version("rustc")?;
    let (major, minor) = parse_rustc_version(&version)
        .ok_or_else(|| ToolchainError::VersionParse(version.clone()))?;
    debug!(major, minor, "probed rustc");
    Ok(major > RUSTC_REQUIRED_MAJOR
        || (major == RUSTC_REQUIRED_MAJOR && minor >= RUSTC_REQUIRED_MINOR))
}

/// Bail out early when the machine cannot run any stage at all.
pub fn require_cargo() -> Result<()> {
    if !is_tool_available("cargo") {
        return Err(ToolchainError::CargoNotFound);
    }
    if !rustc_version_ok()? {
        return Err(ToolchainError::ToolchainTooOld {
            found: tool_version("rustc")?,
            required: format!("{}.{}", RUSTC_REQUIRED_MAJOR, RUSTC_REQUIRED_MINOR),
        });
    }
    Ok(())
}

/// Parse `rustc 1.75.0 (82e1608df 2023-12-21)` into `(1, 75)`.
fn parse_rustc_version(line: &str) -> Option<(u32, u32)> {
    let version = line.split_whitespace().nth(1)?;
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rustc_version() {
        assert_eq!(
            parse_rustc_version("rustc 1.75.0 (82e1608df 2023-12-21)"),
            Some((1, 75))
        );
        assert_eq!(parse_rustc_version("rustc 2.0.1"), Some((2, 0)));
        assert_eq!(parse_rustc_version("rustc"), None);
        assert_eq!(parse_rustc_version("rustc one.two"), None);
    }

    #[test]
    fn test_is_tool_available_for_cargo() {
        // The test suite itself runs under cargo
        assert!(is_tool_available("cargo"));
    }

    #[test]
    fn test_is_tool_available_for_missing_tool() {
        assert!(!is_tool_available("definitely-not-a-real-tool-2n4x"));
    }

    #[test]
    fn test_tool_version_returns_first_line() {
        let version = tool_version("cargo").expect("cargo --version failed");
        assert!(version.starts_with("cargo"));
        assert!(!version.contains('\n'));
    }

    #[test]
    fn test_tool_version_missing_tool() {
        let err = tool_version("definitely-not-a-real-tool-2n4x").unwrap_err();
        assert!(matches!(err, ToolchainError::ToolNotFound(_)));
    }

    #[test]
    fn test_require_cargo_passes_on_dev_machine() {
        require_cargo().expect("cargo and a modern rustc are required to run the tests");
    }
}
