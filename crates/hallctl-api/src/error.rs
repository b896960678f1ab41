use thiserror::Error;

/// Top-level error type for the `hallctl-api` crate.
///
/// Covers every failure mode of the backend client: HTTP transport, response
/// parsing, explicit command rejection, and the live-status push channel.
/// `hallctl-core` folds these into step results and status markers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The backend answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Application ─────────────────────────────────────────────────
    /// Well-formed response carrying an explicit failure flag.
    #[error("Command rejected by backend: {message}")]
    Nack { message: String },

    // ── Push channel ────────────────────────────────────────────────
    /// The live-status stream failed mid-flight.
    #[error("Status stream error: {0}")]
    Stream(String),

    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),
}

/// Three-way failure taxonomy used when classifying command outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network/connection failure or a non-success status.
    Transport,
    /// Response body could not be parsed into the expected shape.
    Protocol,
    /// Well-formed response with an explicit failure flag.
    ApplicationNack,
}

impl Error {
    /// Classify this error into the transport / protocol / nack taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Deserialization { .. } => ErrorKind::Protocol,
            Self::Nack { .. } => ErrorKind::ApplicationNack,
            Self::Transport(_)
            | Self::InvalidUrl(_)
            | Self::Http { .. }
            | Self::ClientBuild(_)
            | Self::Stream(_)
            | Self::WebSocketConnect(_) => ErrorKind::Transport,
        }
    }

    /// Returns `true` if the request never produced a usable response.
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }
}
