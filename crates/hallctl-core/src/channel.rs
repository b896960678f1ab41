// ── Status channel ──
//
// Live status for the selected venue from two independent sources: the
// backend's push channel and a fixed-period poll. Both write the same
// snapshot slot with last-write-wins semantics; there is no ordering
// between them. A failed push channel is not re-opened. Health flips to
// degraded and the poll keeps the snapshot fresh.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hallctl_api::StatusFrames;

use crate::backend::DeviceBackend;
use crate::model::{ChannelHealth, LiveStatusSnapshot, SessionEvent, UpdateSource};
use crate::reconcile::{reconcile_snapshot, rejected_envelope};
use crate::stream::{SnapshotSlot, StatusStream};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Push + poll status channel. At most one venue is active at a time.
pub struct StatusChannel<B: DeviceBackend> {
    backend: Arc<B>,
    poll_interval: Duration,
    shared: Arc<Shared>,
    /// Parent of every per-start token; cancelled on drop.
    cancel: CancellationToken,
    active: Mutex<Option<ActiveChannel>>,
}

/// State written by the background tasks.
struct Shared {
    snapshot: watch::Sender<SnapshotSlot>,
    health: watch::Sender<ChannelHealth>,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn publish(&self, snapshot: LiveStatusSnapshot) {
        self.snapshot.send_replace(Some(Arc::new(snapshot)));
    }
}

struct ActiveChannel {
    venue_id: String,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ActiveChannel {
    /// Cancel both tasks and wait for them to exit.
    async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.tasks {
            let _ = handle.await;
        }
    }
}

impl<B: DeviceBackend> StatusChannel<B> {
    pub fn new(
        backend: Arc<B>,
        poll_interval: Duration,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (health, _) = watch::channel(ChannelHealth::Inactive);
        Self {
            backend,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            shared: Arc::new(Shared {
                snapshot,
                health,
                events,
            }),
            cancel: CancellationToken::new(),
            active: Mutex::new(None),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the channel for `venue_id`.
    ///
    /// A no-op if that venue is already active. If another venue is active,
    /// its channel is stopped first and the snapshot is cleared.
    pub async fn start(&self, venue_id: &str) {
        let mut active = self.active.lock().await;

        if active.as_ref().is_some_and(|a| a.venue_id == venue_id) {
            debug!(venue_id, "status channel already running");
            return;
        }
        if let Some(previous) = active.take() {
            debug!(venue_id = %previous.venue_id, "stopping previous status channel");
            previous.shutdown().await;
        }
        self.shared.snapshot.send_if_modified(|slot| slot.take().is_some());

        let cancel = self.cancel.child_token();
        let mut tasks = Vec::with_capacity(2);

        if let Some(frames) = self.backend.push_frames() {
            self.shared.health.send_replace(ChannelHealth::Healthy);
            tasks.push(tokio::spawn(push_task(
                frames,
                Arc::clone(&self.shared),
                venue_id.to_owned(),
                cancel.clone(),
            )));
        } else {
            self.shared.health.send_replace(ChannelHealth::Degraded);
            info!(venue_id, "push channel disabled, status from poll only");
        }

        tasks.push(tokio::spawn(poll_task(
            Arc::clone(&self.backend),
            Arc::clone(&self.shared),
            venue_id.to_owned(),
            self.poll_interval,
            cancel.clone(),
        )));

        *active = Some(ActiveChannel {
            venue_id: venue_id.to_owned(),
            cancel,
            tasks,
        });
        info!(venue_id, poll_interval = ?self.poll_interval, "status channel started");
    }

    /// Stop both sources. Safe to call when already stopped.
    ///
    /// Returns once both background tasks have exited, so no snapshot is
    /// published after this resolves. The last snapshot stays readable.
    pub async fn stop(&self) {
        let Some(previous) = self.active.lock().await.take() else {
            return;
        };
        let venue_id = previous.venue_id.clone();
        previous.shutdown().await;
        self.shared.health.send_replace(ChannelHealth::Inactive);
        info!(venue_id = %venue_id, "status channel stopped");
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> StatusStream {
        StatusStream::new(self.shared.snapshot.subscribe())
    }

    pub fn latest(&self) -> SnapshotSlot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn health(&self) -> ChannelHealth {
        *self.shared.health.borrow()
    }

    pub fn watch_health(&self) -> watch::Receiver<ChannelHealth> {
        self.shared.health.subscribe()
    }

    /// The venue the channel is running for, if any.
    pub async fn active_venue(&self) -> Option<String> {
        self.active.lock().await.as_ref().map(|a| a.venue_id.clone())
    }
}

impl<B: DeviceBackend> Drop for StatusChannel<B> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Consume push frames until cancelled or the channel fails.
async fn push_task(
    mut frames: StatusFrames,
    shared: Arc<Shared>,
    venue_id: String,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            frame = frames.next() => frame,
        };

        let reason = match next {
            Some(Ok(raw)) => {
                match rejected_envelope(&raw) {
                    Some(reason) => {
                        debug!(venue_id = %venue_id, reason = %reason, "push frame reports failure, keeping last snapshot");
                    }
                    None => shared.publish(reconcile_snapshot(&raw, UpdateSource::Push)),
                }
                continue;
            }
            Some(Err(e)) => e.to_string(),
            None => "stream closed by backend".to_owned(),
        };

        warn!(venue_id = %venue_id, reason = %reason, "push channel lost, continuing on poll");
        shared.health.send_replace(ChannelHealth::Degraded);
        let _ = shared
            .events
            .send(SessionEvent::PushDegraded { venue_id, reason });
        return;
    }
}

/// Fetch a snapshot immediately and then once per `period`.
async fn poll_task<B: DeviceBackend>(
    backend: Arc<B>,
    shared: Arc<Shared>,
    venue_id: String,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = backend.fetch_status() => result,
        };

        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                debug!(venue_id = %venue_id, error = %e, "status poll failed, keeping last snapshot");
                continue;
            }
        };
        match rejected_envelope(&raw) {
            Some(reason) => {
                debug!(venue_id = %venue_id, reason = %reason, "status poll reports failure, keeping last snapshot");
            }
            None => shared.publish(reconcile_snapshot(&raw, UpdateSource::Poll)),
        }
    }
}
