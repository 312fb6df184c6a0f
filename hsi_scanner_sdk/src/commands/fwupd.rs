//! fwupd command executor configuration

use hsi_scanner_base::strategies::{SystemCommandExecutor, BUSCTL};
use std::time::Duration;

/// Create command executor configured for querying fwupd over the bus
///
/// Whitelist includes:
/// - busctl: method calls and property reads with JSON output
pub fn create_fwupd_command_executor(timeout: Duration) -> SystemCommandExecutor {
    let mut executor = SystemCommandExecutor::with_timeout(timeout);
    executor.allow_commands(&[BUSCTL]);
    executor
}
