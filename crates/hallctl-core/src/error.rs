// ── Core error types ──
//
// Errors that escape the core crate. Device-command failures never show up
// here: they are folded into `CommandReply` / `StepResult` at the call site.
// The `From<hallctl_api::Error>` impl covers construction-time failures
// (client build, URL parsing) that do propagate.

use thiserror::Error;

use hallctl_api::ErrorKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Unknown venue: {id}")]
    UnknownVenue { id: String },

    #[error("No venue selected")]
    NoVenueSelected,

    #[error("A shutdown is already running for venue {venue_id}")]
    ShutdownInProgress { venue_id: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        kind: ErrorKind,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hallctl_api::Error> for CoreError {
    fn from(err: hallctl_api::Error) -> Self {
        match err {
            hallctl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid backend URL: {e}"),
            },
            hallctl_api::Error::ClientBuild(message) => CoreError::Config { message },
            hallctl_api::Error::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                kind: ErrorKind::Transport,
                status: Some(status),
            },
            other => {
                let kind = other.kind();
                CoreError::Api {
                    message: other.to_string(),
                    kind,
                    status: None,
                }
            }
        }
    }
}

impl CoreError {
    /// Returns `true` if this error means the venue could not be resolved.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownVenue { .. })
    }
}
