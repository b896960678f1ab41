// Shared transport configuration for building reqwest::Client instances.
//
// The backend client and the push subscription share timeout and TLS
// settings through this module.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("hallctl/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Accept any certificate (for self-signed hall servers).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout. This is the only timeout applied to commands and
    /// status fetches.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` for request/response calls.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    /// Build a `reqwest::Client` for long-lived streaming responses.
    ///
    /// The total-request timeout is replaced by a connect timeout so the
    /// event stream is not cut off after `timeout`.
    pub fn build_streaming_client(&self) -> Result<reqwest::Client, Error> {
        self.builder()
            .connect_timeout(self.timeout)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    fn builder(&self) -> reqwest::ClientBuilder {
        let builder = reqwest::Client::builder().user_agent(USER_AGENT);
        match self.tls {
            TlsMode::System => builder,
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        }
    }
}
