//! Preflight toolchain - the environment/tooling layer for preflight.
//!
//! Everything the orchestrator needs to know about the machine it runs on:
//! - Probing that the minimum toolchain (cargo + rustc) is present
//! - Fingerprinting the toolchain so runs are attributable
//! - Fetching pinned checker binaries with digest verification
//! - Discovering the native-extension sources the formatters operate on

pub mod error;
pub mod fetch;
pub mod fingerprint;
pub mod probe;
pub mod sources;

pub use error::{Result, ToolchainError};
pub use fetch::{ensure_tool, file_sha256, verify_or_remove, PinnedTool};
pub use fingerprint::{toolchain_fingerprint, ToolchainFingerprint};
pub use probe::{is_tool_available, require_cargo, rustc_version_ok, tool_version};
pub use sources::collect_native_sources;
