// Projector endpoints
//
// Lamp power, the mechanical dowser (shutter), and the auditorium lights
// wired through the projector's automation outputs.

use tracing::debug;

use crate::backend::client::BackendClient;
use crate::backend::models::{Ack, DowserRequest, LampRequest};
use crate::error::Error;

impl BackendClient {
    /// Switch the projector lamp on or off.
    ///
    /// `POST /api/{device_id}/lamp` with `{"on": bool}`
    pub async fn set_lamp(&self, device_id: &str, on: bool) -> Result<Ack, Error> {
        let url = self.api_url(&[device_id, "lamp"])?;
        debug!(device_id, on, "setting lamp power");
        self.post_json(url, &LampRequest { on }).await
    }

    /// Open or close the dowser.
    ///
    /// `POST /api/{device_id}/dowser` with `{"closed": bool}`
    pub async fn set_dowser(&self, device_id: &str, closed: bool) -> Result<Ack, Error> {
        let url = self.api_url(&[device_id, "dowser"])?;
        debug!(device_id, closed, "setting dowser");
        self.post_json(url, &DowserRequest { closed }).await
    }

    /// Switch the auditorium lights.
    ///
    /// `POST /api/{device_id}/light/{on|off}`
    pub async fn set_light(&self, device_id: &str, on: bool) -> Result<Ack, Error> {
        let state = if on { "on" } else { "off" };
        let url = self.api_url(&[device_id, "light", state])?;
        debug!(device_id, on, "switching lights");
        self.post_empty(url).await
    }

    /// Power off the lamp.
    pub async fn lamp_off(&self, device_id: &str) -> Result<Ack, Error> {
        self.set_lamp(device_id, false).await
    }

    /// Close the dowser.
    pub async fn close_dowser(&self, device_id: &str) -> Result<Ack, Error> {
        self.set_dowser(device_id, true).await
    }
}
