// ── Operator commands ──
//
// Direct device commands and the structured reply every command produces.
// Replies are built at the call site from the transport result, so no
// command failure ever propagates as an error.

use serde::Serialize;
use strum::Display;
use tracing::debug;

use hallctl_api::{Ack, ErrorKind};

use crate::backend::DeviceBackend;
use crate::model::Venue;

/// Highest fader value the audio processor accepts.
pub const MAX_AUDIO_LEVEL: u8 = 100;

/// A single device command addressed to a venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display)]
#[serde(tag = "command", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    Play,
    Stop,
    Lamp { on: bool },
    Dowser { closed: bool },
    Light { on: bool },
    AudioLevel { value: u8, force: bool },
    AudioMute { mute: bool },
    AudioInputMode { mode: String },
}

impl Command {
    /// Whether this command addresses the audio processor rather than the
    /// primary device.
    pub fn needs_audio(&self) -> bool {
        matches!(
            self,
            Self::AudioLevel { .. } | Self::AudioMute { .. } | Self::AudioInputMode { .. }
        )
    }

    /// Reject commands that must not reach the backend.
    fn validate(&self) -> Result<(), String> {
        match self {
            Self::AudioLevel { value, .. } if *value > MAX_AUDIO_LEVEL => Err(format!(
                "audio level {value} is outside 0..={MAX_AUDIO_LEVEL}"
            )),
            Self::AudioInputMode { mode } if mode.trim().is_empty() => {
                Err("audio input mode must not be empty".to_owned())
            }
            _ => Ok(()),
        }
    }
}

// ── CommandReply ─────────────────────────────────────────────────────

/// Why a command did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Network failure or non-success HTTP status.
    Transport,
    /// Response body could not be parsed.
    Protocol,
    /// Well-formed response without a positive acknowledgement.
    Nack,
    /// Rejected locally before dispatch.
    Validation,
}

impl From<ErrorKind> for FailureKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Transport => Self::Transport,
            ErrorKind::Protocol => Self::Protocol,
            ErrorKind::ApplicationNack => Self::Nack,
        }
    }
}

/// Structured result of one device command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    /// The request went out and a 2xx response came back.
    pub transport_ok: bool,
    /// The response carried an explicit positive acknowledgement.
    pub application_ack: bool,
    pub message: Option<String>,
    pub failure: Option<FailureKind>,
}

impl CommandReply {
    /// `true` only for a delivered and positively acknowledged command.
    pub fn is_success(&self) -> bool {
        self.transport_ok && self.application_ack
    }

    /// A reply for a command rejected before dispatch.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            transport_ok: false,
            application_ack: false,
            message: Some(message.into()),
            failure: Some(FailureKind::Validation),
        }
    }

    /// Classify a transport result.
    pub fn from_result(result: Result<Ack, hallctl_api::Error>) -> Self {
        match result {
            Ok(ack) if ack.is_positive() => Self {
                transport_ok: true,
                application_ack: true,
                message: ack.detail().map(str::to_owned),
                failure: None,
            },
            Ok(ack) => {
                let message = ack.detail().map_or_else(
                    || match ack.acknowledged() {
                        Some(false) => "backend reported failure".to_owned(),
                        _ => "response carried no acknowledgement".to_owned(),
                    },
                    str::to_owned,
                );
                Self {
                    transport_ok: true,
                    application_ack: false,
                    message: Some(message),
                    failure: Some(FailureKind::Nack),
                }
            }
            Err(err) => {
                let kind = err.kind();
                Self {
                    // A parse failure still means the request was delivered.
                    transport_ok: kind != ErrorKind::Transport,
                    application_ack: false,
                    message: Some(err.to_string()),
                    failure: Some(kind.into()),
                }
            }
        }
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────

/// Validate and send `command` to the matching device of `venue`.
pub async fn dispatch<B: DeviceBackend>(
    backend: &B,
    venue: &Venue,
    command: &Command,
) -> CommandReply {
    if let Err(message) = command.validate() {
        return CommandReply::rejected(message);
    }

    let device = venue.device_id.as_str();
    let audio = if command.needs_audio() {
        match venue.audio_device_id.as_deref() {
            Some(id) => id,
            None => {
                return CommandReply::rejected(format!(
                    "venue {} has no audio processor configured",
                    venue.id
                ));
            }
        }
    } else {
        ""
    };

    debug!(venue_id = %venue.id, %command, "dispatching command");

    let result = match command {
        Command::Play => backend.start_playback(device).await,
        Command::Stop => backend.stop_playback(device).await,
        Command::Lamp { on } => backend.set_lamp(device, *on).await,
        Command::Dowser { closed } => backend.set_dowser(device, *closed).await,
        Command::Light { on } => backend.set_light(device, *on).await,
        Command::AudioLevel { value, force } => {
            backend.set_audio_level(audio, *value, *force).await
        }
        Command::AudioMute { mute } => backend.set_audio_mute(audio, *mute).await,
        Command::AudioInputMode { mode } => backend.set_audio_input_mode(audio, mode).await,
    };

    CommandReply::from_result(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::testing::{FakeBackend, Reply, venue};

    #[test]
    fn positive_ack_is_success() {
        let reply = CommandReply::from_result(Ok(Ack {
            ok: Some(true),
            ..Ack::default()
        }));
        assert!(reply.is_success());
        assert_eq!(reply.failure, None);
    }

    #[test]
    fn missing_flag_is_nack() {
        let reply = CommandReply::from_result(Ok(Ack::default()));
        assert!(reply.transport_ok);
        assert!(!reply.is_success());
        assert_eq!(reply.failure, Some(FailureKind::Nack));
    }

    #[test]
    fn transport_error_is_not_delivered() {
        let reply = CommandReply::from_result(Err(hallctl_api::Error::Http {
            status: 502,
            body: String::new(),
        }));
        assert!(!reply.transport_ok);
        assert_eq!(reply.failure, Some(FailureKind::Transport));
    }

    #[test]
    fn protocol_error_was_delivered() {
        let reply = CommandReply::from_result(Err(hallctl_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        }));
        assert!(reply.transport_ok);
        assert!(!reply.application_ack);
        assert_eq!(reply.failure, Some(FailureKind::Protocol));
    }

    #[tokio::test]
    async fn audio_level_above_range_never_dispatches() {
        let backend = FakeBackend::default();
        let reply = dispatch(
            &backend,
            &venue(Some("cp1")),
            &Command::AudioLevel {
                value: 150,
                force: false,
            },
        )
        .await;
        assert_eq!(reply.failure, Some(FailureKind::Validation));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn audio_command_without_processor_is_rejected() {
        let backend = FakeBackend::default();
        let reply = dispatch(&backend, &venue(None), &Command::AudioMute { mute: true }).await;
        assert_eq!(reply.failure, Some(FailureKind::Validation));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn lamp_command_targets_primary_device() {
        let backend = FakeBackend::default();
        let reply = dispatch(&backend, &venue(None), &Command::Lamp { on: true }).await;
        assert!(reply.is_success());
        assert_eq!(backend.calls(), vec!["lamp barco_1 on=true".to_owned()]);
    }

    #[tokio::test]
    async fn light_command_reports_refusal() {
        let backend = FakeBackend::default().reply("light", Reply::Nack);
        let reply = dispatch(&backend, &venue(None), &Command::Light { on: false }).await;
        assert!(reply.transport_ok);
        assert!(!reply.is_success());
        assert_eq!(reply.failure, Some(FailureKind::Nack));
        assert_eq!(backend.calls(), vec!["light barco_1 on=false".to_owned()]);
    }
}
