// Media player endpoints
//
// Playback control on the primary device (the media block behind the
// projector).

use tracing::debug;

use crate::backend::client::BackendClient;
use crate::backend::models::Ack;
use crate::error::Error;

impl BackendClient {
    /// Stop playback.
    ///
    /// `POST /api/{device_id}/stop`
    pub async fn stop_playback(&self, device_id: &str) -> Result<Ack, Error> {
        let url = self.api_url(&[device_id, "stop"])?;
        debug!(device_id, "stopping playback");
        self.post_empty(url).await
    }

    /// Start playback of the loaded show.
    ///
    /// `POST /api/{device_id}/play`
    pub async fn start_playback(&self, device_id: &str) -> Result<Ack, Error> {
        let url = self.api_url(&[device_id, "play"])?;
        debug!(device_id, "starting playback");
        self.post_empty(url).await
    }
}
