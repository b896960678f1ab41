// ── Runtime session configuration ──
//
// These types describe *how* a session talks to the backend and paces its
// shutdown sequence. They never touch disk: `hallctl-config` builds a
// `SessionConfig` from files and environment and hands it in.

use std::time::Duration;

use hallctl_api::TransportConfig;
use url::Url;

/// Fallback poll period for the live-status channel.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Fader value applied by the shutdown sequence.
pub const SAFE_AUDIO_LEVEL: u8 = 30;

/// Audio processor input selected by the shutdown sequence.
pub const NON_SYNC_INPUT_MODE: &str = "non_sync";

/// Settle time between shutdown steps.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Which push channel (if any) backs the live-status feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PushMode {
    /// Poll only; health reports degraded from the start.
    Off,
    /// Server-sent events from the backend's status stream.
    #[default]
    Sse,
    /// JSON frames over a WebSocket at the given URL.
    WebSocket { url: Url },
}

/// Pacing and target values for the shutdown sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownConfig {
    /// Delay between consecutive steps. Zero disables it.
    pub step_delay: Duration,
    /// Fader value for the audio-level step.
    pub audio_level: u8,
    /// Input mode for the audio-input step.
    pub audio_input_mode: String,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            step_delay: DEFAULT_STEP_DELAY,
            audio_level: SAFE_AUDIO_LEVEL,
            audio_input_mode: NON_SYNC_INPUT_MODE.to_owned(),
        }
    }
}

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend root, e.g. `http://192.168.198.21:8089`.
    pub backend_url: Url,
    pub transport: TransportConfig,
    pub poll_interval: Duration,
    pub push: PushMode,
    pub shutdown: ShutdownConfig,
}

impl SessionConfig {
    /// Configuration with default timings for the given backend.
    pub fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            transport: TransportConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            push: PushMode::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}
