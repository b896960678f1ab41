// ── Live status domain types ──
//
// Canonical per-device status produced by the reconciler. Every field that
// the backend may omit carries an explicit unknown state (`Unknown` variant
// or `None`) instead of a default that could be mistaken for real data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use super::venue::Venue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LampState {
    On,
    Off,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DowserState {
    Open,
    Closed,
    #[default]
    Unknown,
}

/// Canonical status of a primary (player/projector) device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub playback: PlaybackState,
    pub title: Option<String>,
    pub position_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    pub lamp: LampState,
    pub dowser: DowserState,
}

impl DeviceStatus {
    /// Time left in the current title, when both ends are known.
    pub fn remaining_ms(&self) -> Option<u64> {
        Some(self.duration_ms?.saturating_sub(self.position_ms?))
    }
}

/// Canonical status of an audio processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudioStatus {
    /// Fader value, 0..=100.
    pub level: Option<u8>,
    pub muted: Option<bool>,
    pub input_mode: Option<String>,
}

/// Which channel produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UpdateSource {
    Push,
    Poll,
}

/// One complete status update. Replaces the previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStatusSnapshot {
    pub devices: BTreeMap<String, DeviceStatus>,
    pub audio: BTreeMap<String, AudioStatus>,
    pub source: UpdateSource,
    pub received_at: DateTime<Utc>,
}

impl LiveStatusSnapshot {
    pub fn empty(source: UpdateSource) -> Self {
        Self {
            devices: BTreeMap::new(),
            audio: BTreeMap::new(),
            source,
            received_at: Utc::now(),
        }
    }

    /// Project the snapshot onto one venue's devices.
    ///
    /// A device missing from the snapshot reads as all-unknown rather than
    /// being dropped.
    pub fn for_venue(&self, venue: &Venue) -> VenueStatus {
        VenueStatus {
            venue_id: venue.id.clone(),
            device: self
                .devices
                .get(&venue.device_id)
                .cloned()
                .unwrap_or_default(),
            audio: venue
                .audio_device_id
                .as_ref()
                .map(|id| self.audio.get(id).cloned().unwrap_or_default()),
            source: self.source,
            received_at: self.received_at,
        }
    }
}

/// The slice of a snapshot relevant to one venue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueStatus {
    pub venue_id: String,
    pub device: DeviceStatus,
    /// `None` when the venue has no audio processor configured.
    pub audio: Option<AudioStatus>,
    pub source: UpdateSource,
    pub received_at: DateTime<Utc>,
}

/// Health of the status channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChannelHealth {
    /// No channel running.
    #[default]
    Inactive,
    /// Push channel open; poll running alongside.
    Healthy,
    /// Push channel lost or disabled; poll only.
    Degraded,
}
