//! Structured logging helpers for controller commands.

use std::time::Duration;

use chronoboard_domain::ChronoBoardError;
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"timer::start"`).
/// * `elapsed` - Duration the command execution took.
/// * `success` - Whether the command completed successfully.
///
/// Keeps the controller methods concise and the events grep-able across the
/// codebase. Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `ChronoBoardError` into a stable label suitable for
/// metrics/logging.
#[inline]
pub fn error_label(error: &ChronoBoardError) -> &'static str {
    match error {
        ChronoBoardError::Storage(_) => "storage",
        ChronoBoardError::StateInconsistency(_) => "state_inconsistency",
        ChronoBoardError::MessageDelivery(_) => "message_delivery",
        ChronoBoardError::Config(_) => "config",
        ChronoBoardError::NotFound(_) => "not_found",
        ChronoBoardError::InvalidInput(_) => "invalid_input",
        ChronoBoardError::Internal(_) => "internal",
    }
}
