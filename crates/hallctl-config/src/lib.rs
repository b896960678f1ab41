//! Configuration for hallctl.
//!
//! TOML configuration, the venue registry (inline or in a separate
//! TOML/JSON file), environment overrides, and translation into
//! `hallctl_core::SessionConfig` plus the validated venue list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use hallctl_api::{TlsMode, TransportConfig};
use hallctl_core::config::{DEFAULT_STEP_DELAY, NON_SYNC_INPUT_MODE, SAFE_AUDIO_LEVEL};
use hallctl_core::{Protocol, PushMode, SessionConfig, ShutdownConfig, Venue};

/// Environment variable prefix. Nested keys use `__`, e.g.
/// `HALLCTL_BACKEND__URL`.
pub const ENV_PREFIX: &str = "HALLCTL_";

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8089";
const DEFAULT_VENUE_PORT: u16 = 43748;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to parse venue registry {}: {reason}", path.display())]
    Registry { path: PathBuf, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Optional external venue registry (TOML or JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,

    #[serde(default)]
    pub backend: BackendSection,

    #[serde(default)]
    pub shutdown: ShutdownSection,

    /// CLI presentation defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Inline venue registry.
    #[serde(default, alias = "halls")]
    pub venues: Vec<VenueEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BackendSection {
    /// Backend root URL.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fallback poll period for live status.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Push transport for live status.
    #[serde(default)]
    pub push: PushSetting,

    /// WebSocket endpoint, required when `push = "websocket"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket_url: Option<String>,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            push: PushSetting::default(),
            websocket_url: None,
            insecure: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PushSetting {
    #[default]
    Sse,
    Websocket,
    Off,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ShutdownSection {
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    #[serde(default = "default_audio_level")]
    pub audio_level: u8,

    #[serde(default = "default_audio_input_mode")]
    pub audio_input_mode: String,
}

impl Default for ShutdownSection {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            audio_level: default_audio_level(),
            audio_input_mode: default_audio_input_mode(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

/// One venue as written in configuration. Accepts the older `ip`,
/// `tms_id` and `cp750_id` key names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VenueEntry {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(alias = "ip")]
    pub address: String,

    #[serde(default = "default_venue_port")]
    pub port: u16,

    /// Defaults to `id`.
    #[serde(default, alias = "tms_id", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(default, alias = "cp750_id", skip_serializing_if = "Option::is_none")]
    pub audio_device_id: Option<String>,

    #[serde(default)]
    pub protocol: Protocol,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_ms() -> u64 {
    2000
}
fn default_step_delay_ms() -> u64 {
    u64::try_from(DEFAULT_STEP_DELAY.as_millis()).unwrap_or(500)
}
fn default_audio_level() -> u8 {
    SAFE_AUDIO_LEVEL
}
fn default_audio_input_mode() -> String {
    NON_SYNC_INPUT_MODE.into()
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_venue_port() -> u16 {
    DEFAULT_VENUE_PORT
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "hallctl", "hallctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hallctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// The layered provider stack: defaults, then the TOML file, then
/// `HALLCTL_*` environment variables.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full Config.
///
/// An explicit `path` must exist; the platform default may be absent. A
/// relative `registry` path is resolved against the config file's
/// directory.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let mut config: Config = figment(&path).extract()?;

    if let (Some(registry), Some(dir)) = (config.registry.as_mut(), path.parent()) {
        if registry.is_relative() {
            *registry = dir.join(&*registry);
        }
    }
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config(None).unwrap_or_default()
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Venue registry ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Keyed {
        #[serde(alias = "halls")]
        venues: Vec<VenueEntry>,
    },
    Bare(Vec<VenueEntry>),
}

/// Read a standalone venue registry.
///
/// `.json` files are parsed as JSON, anything else as TOML. The venue list
/// may sit under `venues` or `halls`, or (JSON only) be the whole document.
pub fn load_registry(path: &Path) -> Result<Vec<VenueEntry>, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed: RegistryFile = if is_json {
        serde_json::from_str(&text).map_err(|e| ConfigError::Registry {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    } else {
        toml::from_str(&text).map_err(|e| ConfigError::Registry {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    };

    Ok(match parsed {
        RegistryFile::Keyed { venues } | RegistryFile::Bare(venues) => venues,
    })
}

impl VenueEntry {
    /// Validate and convert into the core venue type.
    pub fn to_venue(&self) -> Result<Venue, ConfigError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(invalid("venues.id", "must not be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(invalid(
                format!("venues.{id}.address"),
                "must not be empty",
            ));
        }

        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        Ok(Venue {
            id: id.to_owned(),
            name: non_empty(&self.name).unwrap_or_else(|| id.to_owned()),
            address: self.address.trim().to_owned(),
            port: self.port,
            device_id: non_empty(&self.device_id).unwrap_or_else(|| id.to_owned()),
            audio_device_id: non_empty(&self.audio_device_id),
            protocol: self.protocol,
        })
    }
}

// ── Translation to core types ───────────────────────────────────────

impl Config {
    /// Inline venues followed by those from the registry file.
    ///
    /// Ids must be unique across both sources.
    pub fn resolve_venues(&self) -> Result<Vec<Venue>, ConfigError> {
        let mut entries = self.venues.clone();
        if let Some(ref path) = self.registry {
            entries.extend(load_registry(path)?);
        }

        let mut seen = HashSet::new();
        entries
            .iter()
            .map(|entry| {
                let venue = entry.to_venue()?;
                if !seen.insert(venue.id.clone()) {
                    return Err(invalid(
                        "venues",
                        format!("duplicate venue id '{}'", venue.id),
                    ));
                }
                Ok(venue)
            })
            .collect()
    }

    /// Build the runtime session configuration.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let backend_url = parse_url("backend.url", &self.backend.url)?;

        if self.backend.poll_interval_ms == 0 {
            return Err(invalid("backend.poll_interval_ms", "must be greater than 0"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(invalid("backend.timeout_secs", "must be greater than 0"));
        }
        if self.shutdown.audio_level > hallctl_core::command::MAX_AUDIO_LEVEL {
            return Err(invalid(
                "shutdown.audio_level",
                format!(
                    "{} is outside 0..={}",
                    self.shutdown.audio_level,
                    hallctl_core::command::MAX_AUDIO_LEVEL
                ),
            ));
        }
        if self.shutdown.audio_input_mode.trim().is_empty() {
            return Err(invalid("shutdown.audio_input_mode", "must not be empty"));
        }

        let push = match self.backend.push {
            PushSetting::Sse => PushMode::Sse,
            PushSetting::Off => PushMode::Off,
            PushSetting::Websocket => {
                let raw = self.backend.websocket_url.as_deref().ok_or_else(|| {
                    invalid("backend.websocket_url", "required when push = \"websocket\"")
                })?;
                PushMode::WebSocket {
                    url: parse_url("backend.websocket_url", raw)?,
                }
            }
        };

        Ok(SessionConfig {
            backend_url,
            transport: TransportConfig {
                tls: if self.backend.insecure {
                    TlsMode::DangerAcceptInvalid
                } else {
                    TlsMode::System
                },
                timeout: Duration::from_secs(self.backend.timeout_secs),
            },
            poll_interval: Duration::from_millis(self.backend.poll_interval_ms),
            push,
            shutdown: ShutdownConfig {
                step_delay: Duration::from_millis(self.shutdown.step_delay_ms),
                audio_level: self.shutdown.audio_level,
                audio_input_mode: self.shutdown.audio_input_mode.trim().to_owned(),
            },
        })
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse()
        .map_err(|_| invalid(field, format!("invalid URL: {raw}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_translate_to_session_config() {
        let session = Config::default().session_config().unwrap();
        assert_eq!(session.backend_url.as_str(), "http://127.0.0.1:8089/");
        assert_eq!(session.poll_interval, Duration::from_secs(2));
        assert_eq!(session.push, PushMode::Sse);
        assert_eq!(session.transport.timeout, Duration::from_secs(10));
        assert_eq!(session.shutdown, ShutdownConfig::default());
    }

    #[test]
    fn loads_toml_with_inline_venues() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.toml",
            r#"
[backend]
url = "http://192.168.198.21:8089"
push = "off"

[shutdown]
step_delay_ms = 0

[[venues]]
id = "hall1"
name = "Hall 1"
ip = "192.168.198.31"
port = 43758
tms_id = "barco_1"
cp750_id = "hall1_cp750"

[[venues]]
id = "hall2"
address = "192.168.198.32"
protocol = "christie"
"#,
        );

        let config = load_config(Some(&path)).unwrap();
        let session = config.session_config().unwrap();
        assert_eq!(session.push, PushMode::Off);
        assert_eq!(session.shutdown.step_delay, Duration::ZERO);

        let venues = config.resolve_venues().unwrap();
        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].device_id, "barco_1");
        assert_eq!(venues[0].audio_device_id.as_deref(), Some("hall1_cp750"));
        assert_eq!(venues[1].name, "hall2");
        assert_eq!(venues[1].device_id, "hall2");
        assert_eq!(venues[1].port, DEFAULT_VENUE_PORT);
        assert_eq!(venues[1].protocol, Protocol::Christie);
        assert_eq!(venues[1].audio_device_id, None);
    }

    #[test]
    fn json_registry_with_halls_key() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "halls_config.json",
            r#"{ "halls": [
                { "id": "hall3", "name": "Зал 3", "ip": "10.0.0.3", "port": 43748, "cp750_id": "" }
            ] }"#,
        );
        let path = write(dir.path(), "config.toml", "registry = \"halls_config.json\"\n");

        let config = load_config(Some(&path)).unwrap();
        let venues = config.resolve_venues().unwrap();
        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].name, "Зал 3");
        assert_eq!(venues[0].audio_device_id, None);
    }

    #[test]
    fn bare_json_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "venues.json",
            r#"[ { "id": "a", "address": "10.0.0.1" } ]"#,
        );
        assert_eq!(load_registry(&path).unwrap()[0].id, "a");
    }

    #[test]
    fn duplicate_ids_across_sources_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "registry.toml",
            "[[venues]]\nid = \"hall1\"\naddress = \"10.0.0.9\"\n",
        );
        let path = write(
            dir.path(),
            "config.toml",
            "registry = \"registry.toml\"\n[[venues]]\nid = \"hall1\"\naddress = \"10.0.0.1\"\n",
        );

        let err = load_config(Some(&path))
            .unwrap()
            .resolve_venues()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }), "{err}");
    }

    #[test]
    fn empty_id_is_rejected() {
        let entry = VenueEntry {
            id: "  ".into(),
            name: None,
            address: "10.0.0.1".into(),
            port: 1,
            device_id: None,
            audio_device_id: None,
            protocol: Protocol::Barco,
        };
        assert!(entry.to_venue().is_err());
    }

    #[test]
    fn websocket_push_needs_url() {
        let mut config = Config::default();
        config.backend.push = PushSetting::Websocket;
        assert!(config.session_config().is_err());

        config.backend.websocket_url = Some("ws://10.0.0.5:8089/api/status/ws".into());
        match config.session_config().unwrap().push {
            PushMode::WebSocket { url } => assert_eq!(url.scheme(), "ws"),
            other => panic!("expected WebSocket, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut config = Config::default();
        config.shutdown.audio_level = 101;
        assert!(config.session_config().is_err());

        let mut config = Config::default();
        config.backend.poll_interval_ms = 0;
        assert!(config.session_config().is_err());

        let mut config = Config::default();
        config.backend.url = "not a url".into();
        assert!(config.session_config().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn save_then_load_keeps_venues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            venues: vec![VenueEntry {
                id: "hall1".into(),
                name: Some("Hall 1".into()),
                address: "10.0.0.1".into(),
                port: 43748,
                device_id: Some("barco_1".into()),
                audio_device_id: None,
                protocol: Protocol::Barco,
            }],
            ..Config::default()
        };
        save_config(&config, &path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.venues, config.venues);
    }
}
