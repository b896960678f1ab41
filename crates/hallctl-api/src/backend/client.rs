// Backend HTTP client
//
// Wraps `reqwest::Client` with URL construction and acknowledgement
// parsing. Endpoint groups (player, projector, audio, status) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::backend::models::Ack;
use crate::error::Error;
use crate::transport::TransportConfig;

const BODY_PREVIEW: usize = 200;

/// Raw HTTP client for the device-control backend.
///
/// Every command method returns the parsed [`Ack`] on a 2xx response. A
/// negative acknowledgement is *not* turned into an error here -- callers
/// decide whether to use [`Ack::into_result`] or classify it themselves.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root, e.g. `http://192.168.198.21:8089`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            stream_http: transport.build_streaming_client()?,
            base_url,
        })
    }

    /// Create a backend client with a pre-built `reqwest::Client`.
    ///
    /// The same client is used for the event stream, so it should not carry
    /// a total-request timeout.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            stream_http: http.clone(),
            http,
            base_url,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn stream_http(&self) -> &reqwest::Client {
        &self.stream_http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{segments...}`.
    ///
    /// Each segment is percent-encoded, so device ids from configuration are
    /// safe to pass through unchanged.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and return the JSON body.
    pub(crate) async fn get_json(&self, url: Url) -> Result<serde_json::Value, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        let body = read_success_body(resp).await?;
        parse_body(&body)
    }

    /// Send a bodiless POST and parse the acknowledgement.
    pub(crate) async fn post_empty(&self, url: Url) -> Result<Ack, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await?;
        let body = read_success_body(resp).await?;
        parse_body(&body)
    }

    /// Send a POST with a JSON body and parse the acknowledgement.
    pub(crate) async fn post_json(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Ack, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        let body = read_success_body(resp).await?;
        parse_body(&body)
    }
}

impl Ack {
    /// Convert a negative or missing acknowledgement into [`Error::Nack`].
    pub fn into_result(self) -> Result<Self, Error> {
        if self.is_positive() {
            return Ok(self);
        }
        let message = self.detail().map_or_else(
            || match self.acknowledged() {
                Some(false) => "backend reported failure".to_owned(),
                _ => "response carried no acknowledgement".to_owned(),
            },
            str::to_owned,
        );
        Err(Error::Nack { message })
    }
}

async fn read_success_body(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            body: preview(&body).to_owned(),
        });
    }
    Ok(resp.text().await?)
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW {
        return body;
    }
    let mut end = BODY_PREVIEW;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_without_double_slash() {
        let client = BackendClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://10.0.0.5:8089/").unwrap(),
        );
        let url = client.api_url(&["status", "live"]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8089/api/status/live");
    }

    #[test]
    fn api_url_encodes_device_ids() {
        let client = BackendClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://10.0.0.5:8089").unwrap(),
        );
        let url = client.api_url(&["hall 1/a", "stop"]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8089/api/hall%201%2Fa/stop");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= BODY_PREVIEW);
        assert!(body.starts_with(cut));
    }

    #[test]
    fn negative_ack_becomes_nack() {
        let ack = Ack {
            ok: Some(false),
            error: Some("lamp cooling".into()),
            ..Ack::default()
        };
        match ack.into_result() {
            Err(Error::Nack { message }) => assert_eq!(message, "lamp cooling"),
            other => panic!("expected Nack, got {other:?}"),
        }
    }

    #[test]
    fn missing_flag_becomes_nack() {
        let ack = Ack::default();
        assert!(matches!(ack.into_result(), Err(Error::Nack { .. })));
    }
}
