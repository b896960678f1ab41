//! Shared helpers for command handlers.

use std::io::IsTerminal;

use hallctl_core::{UNKNOWN, format_duration};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin there is nobody to ask, so the operation is
/// refused instead.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Display an optional value, falling back to the unknown marker.
pub fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| UNKNOWN.to_owned(), |v| v.to_string())
}

/// `position / duration` in clock format.
pub fn progress(position_ms: Option<u64>, duration_ms: Option<u64>) -> String {
    format!(
        "{} / {}",
        format_duration(position_ms),
        format_duration(duration_ms)
    )
}
