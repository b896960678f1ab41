//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hallctl_api::ErrorKind;
use hallctl_config::ConfigError;
use hallctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    /// The device answered but refused, or a shutdown finished with errors.
    pub const DEVICE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Backend ──────────────────────────────────────────────────────
    #[error("Backend request failed: {message}")]
    #[diagnostic(
        code(hallctl::backend),
        help(
            "Check that the hall backend is running and reachable.\n\
             Configured URL is under [backend] url in your config."
        )
    )]
    Backend { message: String },

    #[error("Backend returned an unexpected response: {message}")]
    #[diagnostic(code(hallctl::protocol))]
    Protocol { message: String },

    #[error("No status received for venue '{venue}' within {seconds}s")]
    #[diagnostic(
        code(hallctl::status_timeout),
        help("The backend did not answer the status poll. Re-run with -v for details.")
    )]
    StatusTimeout { venue: String, seconds: u64 },

    // ── Venues ───────────────────────────────────────────────────────
    #[error("Venue '{id}' not found")]
    #[diagnostic(
        code(hallctl::not_found),
        help("Run: hallctl venues to see configured venues")
    )]
    NotFound { id: String },

    #[error("A shutdown is already running for venue '{venue}'")]
    #[diagnostic(code(hallctl::shutdown_in_progress))]
    ShutdownInProgress { venue: String },

    // ── Device results ───────────────────────────────────────────────
    #[error("'{command}' failed on venue '{venue}': {message}")]
    #[diagnostic(code(hallctl::command_failed))]
    CommandFailed {
        venue: String,
        command: String,
        message: String,
    },

    #[error("Shutdown of venue '{venue}' completed with errors ({failed} failed)")]
    #[diagnostic(
        code(hallctl::shutdown_incomplete),
        help("Every step was attempted. Check the failed steps at the venue.")
    )]
    ShutdownIncomplete { venue: String, failed: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hallctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(hallctl::no_config),
        help("Pass an existing file with --config, or create one at the default location.")
    )]
    NoConfig { path: String },

    #[error("No venues configured")]
    #[diagnostic(
        code(hallctl::no_venues),
        help(
            "Add [[venues]] entries to your config, or point `registry` at a\n\
             halls file. Expected config at: {path}"
        )
    )]
    NoVenues { path: String },

    #[error(transparent)]
    #[diagnostic(code(hallctl::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(hallctl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(hallctl::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Backend { .. } | Self::Protocol { .. } => exit_code::CONNECTION,
            Self::StatusTimeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ShutdownInProgress { .. } => exit_code::CONFLICT,
            Self::CommandFailed { .. } | Self::ShutdownIncomplete { .. } => exit_code::DEVICE,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NoConfig { .. }
            | Self::NoVenues { .. }
            | Self::Config(_) => exit_code::USAGE,
            Self::Io(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownVenue { id } => CliError::NotFound { id },

            CoreError::NoVenueSelected => CliError::Validation {
                field: "venue".into(),
                reason: "no venue selected".into(),
            },

            CoreError::ShutdownInProgress { venue_id } => {
                CliError::ShutdownInProgress { venue: venue_id }
            }

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Api {
                message,
                kind: ErrorKind::Protocol,
                ..
            } => CliError::Protocol { message },

            CoreError::Api { message, .. } => CliError::Backend { message },

            CoreError::Internal(message) => CliError::Backend { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_venue_maps_to_not_found_exit_code() {
        let err = CliError::from(CoreError::UnknownVenue { id: "hall9".into() });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "Venue 'hall9' not found");
    }

    #[test]
    fn protocol_errors_keep_their_kind() {
        let err = CliError::from(CoreError::Api {
            message: "expected value".into(),
            kind: ErrorKind::Protocol,
            status: None,
        });
        assert!(matches!(err, CliError::Protocol { .. }));
    }

    #[test]
    fn busy_venue_is_a_conflict() {
        let err = CliError::from(CoreError::ShutdownInProgress {
            venue_id: "hall1".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
    }
}
