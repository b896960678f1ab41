//! Live-status push channel.
//!
//! Two transports carry the same JSON status frames: server-sent events
//! (the backend's `/api/status/stream`) and a WebSocket endpoint. Both are
//! exposed as a [`StatusFrames`] stream that yields one JSON value per frame.
//!
//! The stream never reconnects on its own. A transport failure or a frame
//! that is not valid JSON yields a single `Err` and then the stream ends; a
//! clean close simply ends the stream. Reconnection policy belongs to the
//! consumer.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//!
//! let mut frames = client.status_stream()?;
//! while let Some(frame) = frames.next().await {
//!     match frame {
//!         Ok(json) => println!("{json}"),
//!         Err(e) => eprintln!("push channel lost: {e}"),
//!     }
//! }
//! ```

use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite;
use url::Url;

use crate::error::Error;

/// A stream of raw status frames from either push transport.
pub type StatusFrames = Pin<Box<dyn Stream<Item = Result<serde_json::Value, Error>> + Send>>;

// ── Server-sent events ───────────────────────────────────────────────

/// Open an SSE subscription and stream its `data:` payloads as JSON.
pub(crate) fn event_stream(http: reqwest::Client, url: Url) -> StatusFrames {
    Box::pin(try_stream! {
        tracing::info!(url = %url, "opening status event stream");

        let resp = http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            Err::<(), Error>(Error::Http {
                status: status.as_u16(),
                body: String::new(),
            })?;
        }

        let mut bytes = resp.bytes_stream();
        let mut decoder = SseDecoder::default();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for data in decoder.feed(&chunk) {
                yield parse_frame(&data)?;
            }
        }

        tracing::info!("status event stream ended");
    })
}

/// Incremental decoder for the `text/event-stream` wire format.
///
/// Buffers partial chunks, splits on blank lines, and returns the joined
/// `data:` lines of each complete event. Comment lines (`:`) and the
/// `event:`/`id:`/`retry:` fields are ignored.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Feed a chunk; returns the data payloads of every completed event.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buf.drain(..pos + 2).collect();
            let text = String::from_utf8_lossy(&block);

            let data: Vec<&str> = text
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
                .collect();

            if !data.is_empty() {
                events.push(data.join("\n"));
            }
        }
        events
    }
}

// ── WebSocket ────────────────────────────────────────────────────────

/// Open a WebSocket subscription and stream its text frames as JSON.
pub fn websocket_stream(url: Url) -> StatusFrames {
    Box::pin(try_stream! {
        tracing::info!(url = %url, "connecting status WebSocket");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("status WebSocket connected");

        let (_write, mut read) = ws_stream.split();

        while let Some(frame) = read.next().await {
            match frame.map_err(|e| Error::Stream(e.to_string()))? {
                tungstenite::Message::Text(text) => {
                    yield parse_frame(text.as_str())?;
                }
                tungstenite::Message::Close(frame) => {
                    if let Some(ref cf) = frame {
                        tracing::info!(
                            code = %cf.code,
                            reason = %cf.reason,
                            "status WebSocket close frame received"
                        );
                    }
                    break;
                }
                _ => {
                    // Binary, Ping, Pong, Frame -- ignore
                }
            }
        }

        tracing::info!("status WebSocket stream ended");
    })
}

// ── Frame parsing ────────────────────────────────────────────────────

fn parse_frame(text: &str) -> Result<serde_json::Value, Error> {
    serde_json::from_str(text).map_err(|e| Error::Deserialization {
        message: format!("malformed status frame: {e}"),
        body: text.to_owned(),
    })
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_event() {
        let mut decoder = SseDecoder::default();
        let events = decoder.feed(b"data: {\"a\":1}\n\n");
        assert_eq!(events, vec![r#"{"a":1}"#.to_owned()]);
    }

    #[test]
    fn buffers_event_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.feed(b"event: status\ndata: {\"a\"").is_empty());
        let events = decoder.feed(b":1}\n\ndata: 2\n\n");
        assert_eq!(events, vec![r#"{"a":1}"#.to_owned(), "2".to_owned()]);
    }

    #[test]
    fn joins_multiline_data_and_skips_comments() {
        let mut decoder = SseDecoder::default();
        let events = decoder.feed(b": keepalive\n\ndata: [1,\ndata: 2]\nid: 7\n\n");
        assert_eq!(events, vec!["[1,\n2]".to_owned()]);
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let mut decoder = SseDecoder::default();
        let events = decoder.feed(b"data: true\r\n\r\n");
        assert_eq!(events, vec!["true".to_owned()]);
    }

    #[test]
    fn malformed_frame_is_protocol_error() {
        let err = parse_frame("{not json").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Protocol);
    }
}
