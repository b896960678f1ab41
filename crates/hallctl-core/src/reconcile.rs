// ── Status reconciliation ──
//
// Maps raw backend status payloads onto the canonical model. Two field
// schemes are in the wild for the same concepts:
//
//   current:  { "state", "title", "position_ms", "duration_ms", "lamp", "dowser" }
//   legacy:   { "playback": { "status", "title", "position", "duration" },
//               "projector": { "lamp_on", "dowser_closed" } }
//
// Each canonical field resolves through current -> legacy -> unknown. A value
// that is present but unusable (wrong type, unparseable string) counts as
// absent and the chain moves on. Nothing here returns an error.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::model::{
    AudioStatus, DeviceStatus, DowserState, LampState, LiveStatusSnapshot, PlaybackState,
    UpdateSource,
};

/// Display marker for a value the backend did not supply.
pub const UNKNOWN: &str = "--";

// ── Schema variants ──────────────────────────────────────────────────
//
// Every leaf is kept as a raw `Value` so that a type mismatch never fails
// the whole payload.

#[derive(Debug, Default, Deserialize)]
struct CurrentDevicePayload {
    state: Option<Value>,
    title: Option<Value>,
    position_ms: Option<Value>,
    duration_ms: Option<Value>,
    lamp: Option<Value>,
    dowser: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyDevicePayload {
    #[serde(default, deserialize_with = "lenient")]
    playback: LegacyPlayback,
    #[serde(default, deserialize_with = "lenient")]
    projector: LegacyProjector,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyPlayback {
    status: Option<Value>,
    title: Option<Value>,
    position: Option<Value>,
    duration: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyProjector {
    lamp_on: Option<Value>,
    dowser_closed: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentAudioPayload {
    level: Option<Value>,
    mute: Option<Value>,
    input_mode: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyAudioPayload {
    fader: Option<Value>,
    muted: Option<Value>,
    input: Option<Value>,
}

/// Decode a schema variant, treating a non-object or mistyped payload as
/// empty.
fn decode<T: for<'de> Deserialize<'de> + Default>(raw: &Value) -> T {
    T::deserialize(raw).unwrap_or_default()
}

/// A legacy section of the wrong shape is empty, without failing its
/// siblings.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(T::deserialize(raw).unwrap_or_default())
}

/// First candidate that parses.
fn resolve<T>(candidates: [Option<&Value>; 2], parse: impl Fn(&Value) -> Option<T>) -> Option<T> {
    candidates.into_iter().flatten().find_map(parse)
}

// ── Device / audio reconciliation ────────────────────────────────────

/// Reconcile one primary-device payload.
pub fn reconcile_device(raw: &Value) -> DeviceStatus {
    let current: CurrentDevicePayload = decode(raw);
    let legacy: LegacyDevicePayload = decode(raw);

    DeviceStatus {
        playback: resolve(
            [current.state.as_ref(), legacy.playback.status.as_ref()],
            parse_playback,
        )
        .unwrap_or_default(),
        title: resolve(
            [current.title.as_ref(), legacy.playback.title.as_ref()],
            parse_text,
        ),
        position_ms: resolve(
            [
                current.position_ms.as_ref(),
                legacy.playback.position.as_ref(),
            ],
            parse_millis,
        ),
        duration_ms: resolve(
            [
                current.duration_ms.as_ref(),
                legacy.playback.duration.as_ref(),
            ],
            parse_millis,
        ),
        lamp: resolve(
            [current.lamp.as_ref(), legacy.projector.lamp_on.as_ref()],
            parse_lamp,
        )
        .unwrap_or_default(),
        dowser: resolve(
            [
                current.dowser.as_ref(),
                legacy.projector.dowser_closed.as_ref(),
            ],
            parse_dowser,
        )
        .unwrap_or_default(),
    }
}

/// Reconcile one audio-processor payload.
pub fn reconcile_audio(raw: &Value) -> AudioStatus {
    let current: CurrentAudioPayload = decode(raw);
    let legacy: LegacyAudioPayload = decode(raw);

    AudioStatus {
        level: resolve(
            [current.level.as_ref(), legacy.fader.as_ref()],
            parse_level,
        ),
        muted: resolve([current.mute.as_ref(), legacy.muted.as_ref()], parse_flag),
        input_mode: resolve(
            [current.input_mode.as_ref(), legacy.input.as_ref()],
            parse_text,
        ),
    }
}

// ── Envelope ─────────────────────────────────────────────────────────

const AUDIO_KEYS: [&str; 2] = ["audio", "cp750"];
const ENVELOPE_KEYS: [&str; 6] = ["ok", "success", "devices", "audio", "cp750", "timestamp"];

/// Reconcile a full status message from either channel.
///
/// Accepted envelopes:
/// - `{ "devices": { id: payload } }` or `{ "devices": [ { "id": .. } ] }`
/// - a bare map of `id -> payload`
///
/// plus an optional `audio` (legacy: `cp750`) section in the same shapes.
/// An `"ok": false` envelope, or anything that is not an object, yields an
/// empty snapshot.
pub fn reconcile_snapshot(raw: &Value, source: UpdateSource) -> LiveStatusSnapshot {
    let mut snapshot = LiveStatusSnapshot::empty(source);

    let Some(root) = raw.as_object() else {
        return snapshot;
    };
    if root.get("ok").and_then(Value::as_bool) == Some(false) {
        return snapshot;
    }

    let devices = match root.get("devices") {
        Some(section) => entries(section),
        None => root
            .iter()
            .filter(|(k, v)| !ENVELOPE_KEYS.contains(&k.as_str()) && v.is_object())
            .map(|(k, v)| (k.clone(), v))
            .collect(),
    };
    snapshot.devices = devices
        .into_iter()
        .map(|(id, payload)| (id, reconcile_device(payload)))
        .collect();

    if let Some(section) = AUDIO_KEYS.iter().find_map(|k| root.get(*k)) {
        snapshot.audio = entries(section)
            .into_iter()
            .map(|(id, payload)| (id, reconcile_audio(payload)))
            .collect();
    }

    snapshot.received_at = Utc::now();
    snapshot
}

/// The backend's reason when a status envelope reports failure
/// (`"ok": false` or `"success": false`), otherwise `None`.
pub fn rejected_envelope(raw: &Value) -> Option<String> {
    let root = raw.as_object()?;
    let failed = ["ok", "success"]
        .iter()
        .any(|k| root.get(*k).and_then(Value::as_bool) == Some(false));
    failed.then(|| {
        ["error", "message"]
            .iter()
            .find_map(|k| root.get(*k).and_then(parse_text))
            .unwrap_or_else(|| "backend reported failure".to_owned())
    })
}

/// Flatten a keyed map or an array of `{ "id": .. }` records.
fn entries(section: &Value) -> BTreeMap<String, &Value> {
    match section {
        Value::Object(map) => keyed(map),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let id = item
                    .get("id")
                    .or_else(|| item.get("device_id"))
                    .and_then(parse_id)?;
                Some((id, item))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn keyed(map: &Map<String, Value>) -> BTreeMap<String, &Value> {
    map.iter()
        .filter(|(_, v)| v.is_object())
        .map(|(k, v)| (k.clone(), v))
        .collect()
}

// ── Leaf parsers ─────────────────────────────────────────────────────

fn parse_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_text(v: &Value) -> Option<String> {
    let s = v.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_owned())
}

/// JSON number or numeric string.
fn parse_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn parse_millis(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    let n = parse_number(v)?;
    (n >= 0.0).then(|| n.round() as u64)
}

fn parse_level(v: &Value) -> Option<u8> {
    u8::try_from(parse_millis(v)?).ok().filter(|l| *l <= 100)
}

fn parse_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_playback(v: &Value) -> Option<PlaybackState> {
    match v.as_str()?.trim().to_ascii_lowercase().as_str() {
        "playing" | "play" | "running" => Some(PlaybackState::Playing),
        "paused" | "pause" => Some(PlaybackState::Paused),
        "stopped" | "stop" | "idle" => Some(PlaybackState::Stopped),
        _ => None,
    }
}

fn parse_lamp(v: &Value) -> Option<LampState> {
    parse_flag(v).map(|on| if on { LampState::On } else { LampState::Off })
}

/// `"open"` / `"closed"`, or a flag meaning "closed".
fn parse_dowser(v: &Value) -> Option<DowserState> {
    if let Some(s) = v.as_str() {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "opened" => return Some(DowserState::Open),
            "closed" | "close" => return Some(DowserState::Closed),
            _ => {}
        }
    }
    parse_flag(v).map(|closed| {
        if closed {
            DowserState::Closed
        } else {
            DowserState::Open
        }
    })
}

// ── Formatting ───────────────────────────────────────────────────────

/// Render a millisecond duration as `M:SS`, or `H:MM:SS` once it reaches an
/// hour. `None` renders as [`UNKNOWN`].
pub fn format_duration(ms: Option<u64>) -> String {
    let Some(ms) = ms else {
        return UNKNOWN.to_owned();
    };
    let total = ms / 1000;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// [`format_duration`] for an arbitrary raw value; non-numeric or negative
/// input renders as [`UNKNOWN`].
pub fn format_duration_value(raw: Option<&Value>) -> String {
    format_duration(raw.and_then(parse_millis))
}
