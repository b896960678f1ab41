// Backend wire types
//
// Command responses share a loose `{ ok, message?, error? }` shape; request
// bodies are small fixed structs per endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Acknowledgement body returned by every command endpoint.
///
/// The backend is inconsistent about the flag name (`ok` on device routes,
/// `success` on hall routes), so both are accepted. Unknown fields are kept
/// in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Ack {
    /// The explicit acknowledgement flag, if the backend sent one.
    pub fn acknowledged(&self) -> Option<bool> {
        self.ok.or(self.success)
    }

    /// `true` only for an explicit positive acknowledgement.
    pub fn is_positive(&self) -> bool {
        self.acknowledged() == Some(true)
    }

    /// Human-readable detail: the error text first, then the message.
    pub fn detail(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct LampRequest {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct DowserRequest {
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct FaderRequest {
    pub value: u8,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct InputModeRequest<'a> {
    pub mode: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct MuteRequest {
    pub mute: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ack_prefers_ok_flag() {
        let ack: Ack = serde_json::from_str(r#"{"ok": true, "success": false}"#).unwrap();
        assert_eq!(ack.acknowledged(), Some(true));
        assert!(ack.is_positive());
    }

    #[test]
    fn ack_without_flag_is_not_positive() {
        let ack: Ack = serde_json::from_str(r#"{"message": "queued"}"#).unwrap();
        assert_eq!(ack.acknowledged(), None);
        assert!(!ack.is_positive());
        assert_eq!(ack.detail(), Some("queued"));
    }

    #[test]
    fn ack_detail_prefers_error_text() {
        let ack: Ack =
            serde_json::from_str(r#"{"ok": false, "error": "dowser jammed", "message": "x"}"#)
                .unwrap();
        assert_eq!(ack.detail(), Some("dowser jammed"));
    }
}
