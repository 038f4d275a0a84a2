//! Common helpers for the integration tests.

use std::process::Command;

/// True when a working objdump is on PATH. Tests that need the real tool
/// skip themselves gracefully otherwise.
pub fn objdump_available() -> bool {
    Command::new("objdump")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}
