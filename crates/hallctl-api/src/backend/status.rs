// Live status endpoints
//
// The aggregated status snapshot (poll) and its server-sent event feed
// (push). Both return loosely-typed JSON because the per-device field set
// varies by device family and backend version.

use tracing::debug;

use crate::backend::client::BackendClient;
use crate::error::Error;
use crate::push::{self, StatusFrames};

impl BackendClient {
    /// Fetch the aggregated live-status snapshot.
    ///
    /// `GET /api/status/live`
    pub async fn live_status(&self) -> Result<serde_json::Value, Error> {
        let url = self.api_url(&["status", "live"])?;
        debug!("fetching live status");
        self.get_json(url).await
    }

    /// Subscribe to the server-sent status feed.
    ///
    /// `GET /api/status/stream` (`text/event-stream`)
    ///
    /// The returned stream ends after the first transport or parse error;
    /// it is never re-opened automatically.
    pub fn status_stream(&self) -> Result<StatusFrames, Error> {
        let url = self.api_url(&["status", "stream"])?;
        Ok(push::event_stream(self.stream_http().clone(), url))
    }
}
