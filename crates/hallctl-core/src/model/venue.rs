// ── Venue domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Projection server family. Informational only: the backend owns the
/// device protocols.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Protocol {
    #[default]
    Barco,
    Christie,
    Nec,
    Sony,
    #[serde(other)]
    Other,
}

/// A presentation room and the device ids used to address it.
///
/// Immutable once loaded from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    /// Primary device (media player / projector) id on the backend.
    pub device_id: String,
    /// Audio processor id, if the room has one under control.
    pub audio_device_id: Option<String>,
    pub protocol: Protocol,
}

impl Venue {
    /// `address:port` of the room's projection server.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_device_id.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!("Christie".parse::<Protocol>().ok(), Some(Protocol::Christie));
        assert_eq!(Protocol::Barco.to_string(), "barco");
    }

    #[test]
    fn unknown_protocol_deserializes_as_other() {
        let p: Protocol = serde_json::from_str("\"dolby\"").unwrap();
        assert_eq!(p, Protocol::Other);
    }
}
