// Audio processor endpoints
//
// Fader level, mute, and input selection on the cinema audio processor.

use tracing::debug;

use crate::backend::client::BackendClient;
use crate::backend::models::{Ack, FaderRequest, InputModeRequest, MuteRequest};
use crate::error::Error;

impl BackendClient {
    /// Set the main fader.
    ///
    /// `POST /api/cp750/{audio_id}/fader` with `{"value": n, "force": bool}`
    ///
    /// `force` asks the backend to apply the level even when the processor
    /// reports a manual override.
    pub async fn set_audio_level(
        &self,
        audio_id: &str,
        value: u8,
        force: bool,
    ) -> Result<Ack, Error> {
        let url = self.api_url(&["cp750", audio_id, "fader"])?;
        debug!(audio_id, value, force, "setting audio level");
        self.post_json(url, &FaderRequest { value, force }).await
    }

    /// Select the processor input, e.g. `"dig_1"` or `"non_sync"`.
    ///
    /// `POST /api/cp750/{audio_id}/input-mode` with `{"mode": "..."}`
    pub async fn set_audio_input_mode(&self, audio_id: &str, mode: &str) -> Result<Ack, Error> {
        let url = self.api_url(&["cp750", audio_id, "input-mode"])?;
        debug!(audio_id, mode, "setting audio input mode");
        self.post_json(url, &InputModeRequest { mode }).await
    }

    /// Mute or unmute the processor output.
    ///
    /// `POST /api/cp750/{audio_id}/mute` with `{"mute": bool}`
    pub async fn set_audio_mute(&self, audio_id: &str, mute: bool) -> Result<Ack, Error> {
        let url = self.api_url(&["cp750", audio_id, "mute"])?;
        debug!(audio_id, mute, "setting audio mute");
        self.post_json(url, &MuteRequest { mute }).await
    }
}
