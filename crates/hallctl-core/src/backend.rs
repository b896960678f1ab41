// ── Backend seam ──
//
// Everything the core needs from the device-control backend, expressed as a
// trait so the status channel and the shutdown orchestrator can run against
// a scripted fake. `HttpBackend` is the production implementation over
// `hallctl_api::BackendClient`.

use std::future::Future;

use futures_util::stream;
use serde_json::Value;

use hallctl_api::{Ack, BackendClient, Error, StatusFrames, websocket_stream};

use crate::config::{PushMode, SessionConfig};
use crate::error::CoreError;

/// Operations the core consumes from the backend.
///
/// Command methods return the raw transport result; classification into
/// [`CommandReply`](crate::CommandReply) happens at the call site.
pub trait DeviceBackend: Send + Sync + 'static {
    /// Fetch one live-status snapshot (the poll channel).
    fn fetch_status(&self) -> impl Future<Output = Result<Value, Error>> + Send;

    /// Open the push channel, or `None` if push is disabled.
    ///
    /// Failures to open are delivered as the stream's first item.
    fn push_frames(&self) -> Option<StatusFrames>;

    fn stop_playback(&self, device_id: &str) -> impl Future<Output = Result<Ack, Error>> + Send;

    fn start_playback(&self, device_id: &str)
    -> impl Future<Output = Result<Ack, Error>> + Send;

    fn set_lamp(&self, device_id: &str, on: bool)
    -> impl Future<Output = Result<Ack, Error>> + Send;

    fn set_dowser(
        &self,
        device_id: &str,
        closed: bool,
    ) -> impl Future<Output = Result<Ack, Error>> + Send;

    fn set_light(&self, device_id: &str, on: bool)
    -> impl Future<Output = Result<Ack, Error>> + Send;

    fn set_audio_level(
        &self,
        audio_id: &str,
        value: u8,
        force: bool,
    ) -> impl Future<Output = Result<Ack, Error>> + Send;

    fn set_audio_input_mode(
        &self,
        audio_id: &str,
        mode: &str,
    ) -> impl Future<Output = Result<Ack, Error>> + Send;

    fn set_audio_mute(
        &self,
        audio_id: &str,
        mute: bool,
    ) -> impl Future<Output = Result<Ack, Error>> + Send;
}

// ── HttpBackend ──────────────────────────────────────────────────────

/// [`DeviceBackend`] over HTTP, with the configured push transport.
#[derive(Clone)]
pub struct HttpBackend {
    client: BackendClient,
    push: PushMode,
}

impl HttpBackend {
    pub fn new(config: &SessionConfig) -> Result<Self, CoreError> {
        let client = BackendClient::new(config.backend_url.clone(), &config.transport)?;
        Ok(Self::with_client(client, config.push.clone()))
    }

    pub fn with_client(client: BackendClient, push: PushMode) -> Self {
        Self { client, push }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }
}

impl DeviceBackend for HttpBackend {
    async fn fetch_status(&self) -> Result<Value, Error> {
        self.client.live_status().await
    }

    fn push_frames(&self) -> Option<StatusFrames> {
        match &self.push {
            PushMode::Off => None,
            PushMode::Sse => Some(match self.client.status_stream() {
                Ok(frames) => frames,
                Err(e) => Box::pin(stream::once(async move { Err::<Value, Error>(e) })),
            }),
            PushMode::WebSocket { url } => Some(websocket_stream(url.clone())),
        }
    }

    async fn stop_playback(&self, device_id: &str) -> Result<Ack, Error> {
        self.client.stop_playback(device_id).await
    }

    async fn start_playback(&self, device_id: &str) -> Result<Ack, Error> {
        self.client.start_playback(device_id).await
    }

    async fn set_lamp(&self, device_id: &str, on: bool) -> Result<Ack, Error> {
        self.client.set_lamp(device_id, on).await
    }

    async fn set_dowser(&self, device_id: &str, closed: bool) -> Result<Ack, Error> {
        self.client.set_dowser(device_id, closed).await
    }

    async fn set_light(&self, device_id: &str, on: bool) -> Result<Ack, Error> {
        self.client.set_light(device_id, on).await
    }

    async fn set_audio_level(&self, audio_id: &str, value: u8, force: bool) -> Result<Ack, Error> {
        self.client.set_audio_level(audio_id, value, force).await
    }

    async fn set_audio_input_mode(&self, audio_id: &str, mode: &str) -> Result<Ack, Error> {
        self.client.set_audio_input_mode(audio_id, mode).await
    }

    async fn set_audio_mute(&self, audio_id: &str, mute: bool) -> Result<Ack, Error> {
        self.client.set_audio_mute(audio_id, mute).await
    }
}

// ── Scripted fake ────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    use super::*;
    use crate::model::{Protocol, Venue};

    pub(crate) fn venue(audio: Option<&str>) -> Venue {
        Venue {
            id: "hall1".into(),
            name: "Hall 1".into(),
            address: "192.168.198.21".into(),
            port: 43748,
            device_id: "barco_1".into(),
            audio_device_id: audio.map(str::to_owned),
            protocol: Protocol::Barco,
        }
    }

    /// How the fake answers one operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Reply {
        Ack,
        Nack,
        NoFlag,
        Transport,
        Protocol,
    }

    impl Reply {
        fn into_result(self) -> Result<Ack, Error> {
            match self {
                Self::Ack => Ok(Ack {
                    ok: Some(true),
                    ..Ack::default()
                }),
                Self::Nack => Ok(Ack {
                    ok: Some(false),
                    error: Some("device refused".into()),
                    ..Ack::default()
                }),
                Self::NoFlag => Ok(Ack::default()),
                Self::Transport => Err(Error::Http {
                    status: 502,
                    body: "bad gateway".into(),
                }),
                Self::Protocol => Err(Error::Deserialization {
                    message: "expected value".into(),
                    body: "<html>".into(),
                }),
            }
        }
    }

    /// Records every command and answers from a per-operation script
    /// (default: positive ack).
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        calls: Mutex<Vec<String>>,
        replies: Mutex<HashMap<&'static str, Reply>>,
        status: Mutex<Value>,
        fetches: AtomicUsize,
        fetch_fails: AtomicBool,
        push: Mutex<Option<mpsc::UnboundedReceiver<Result<Value, Error>>>>,
    }

    impl FakeBackend {
        pub(crate) fn reply(self, op: &'static str, reply: Reply) -> Self {
            self.replies.lock().unwrap().insert(op, reply);
            self
        }

        pub(crate) fn set_status(&self, status: Value) {
            *self.status.lock().unwrap() = status;
        }

        pub(crate) fn fail_fetches(&self, fail: bool) {
            self.fetch_fails.store(fail, Ordering::SeqCst);
        }

        /// Arm the push channel for the next `push_frames` call.
        pub(crate) fn arm_push(&self) -> mpsc::UnboundedSender<Result<Value, Error>> {
            let (tx, rx) = mpsc::unbounded_channel();
            *self.push.lock().unwrap() = Some(rx);
            tx
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn record(&self, op: &'static str, call: String) -> Result<Ack, Error> {
            self.calls.lock().unwrap().push(call);
            self.replies
                .lock()
                .unwrap()
                .get(op)
                .copied()
                .unwrap_or(Reply::Ack)
                .into_result()
        }
    }

    impl DeviceBackend for FakeBackend {
        async fn fetch_status(&self) -> Result<Value, Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fetch_fails.load(Ordering::SeqCst) {
                return Err(Error::Http {
                    status: 503,
                    body: String::new(),
                });
            }
            Ok(self.status.lock().unwrap().clone())
        }

        fn push_frames(&self) -> Option<StatusFrames> {
            let rx = self.push.lock().unwrap().take()?;
            Some(Box::pin(UnboundedReceiverStream::new(rx)))
        }

        async fn stop_playback(&self, device_id: &str) -> Result<Ack, Error> {
            self.record("stop", format!("stop {device_id}"))
        }

        async fn start_playback(&self, device_id: &str) -> Result<Ack, Error> {
            self.record("play", format!("play {device_id}"))
        }

        async fn set_lamp(&self, device_id: &str, on: bool) -> Result<Ack, Error> {
            self.record("lamp", format!("lamp {device_id} on={on}"))
        }

        async fn set_dowser(&self, device_id: &str, closed: bool) -> Result<Ack, Error> {
            self.record("dowser", format!("dowser {device_id} closed={closed}"))
        }

        async fn set_light(&self, device_id: &str, on: bool) -> Result<Ack, Error> {
            self.record("light", format!("light {device_id} on={on}"))
        }

        async fn set_audio_level(
            &self,
            audio_id: &str,
            value: u8,
            force: bool,
        ) -> Result<Ack, Error> {
            self.record(
                "fader",
                format!("fader {audio_id} value={value} force={force}"),
            )
        }

        async fn set_audio_input_mode(&self, audio_id: &str, mode: &str) -> Result<Ack, Error> {
            self.record("input-mode", format!("input-mode {audio_id} mode={mode}"))
        }

        async fn set_audio_mute(&self, audio_id: &str, mute: bool) -> Result<Ack, Error> {
            self.record("mute", format!("mute {audio_id} mute={mute}"))
        }
    }
}
