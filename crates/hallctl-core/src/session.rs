// ── Session facade ──
//
// One operator session: the venue registry, the currently selected venue,
// the live-status channel that follows the selection, and the shutdown
// orchestrator. All state that a front end needs lives here; nothing is
// global.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info};

use crate::backend::{DeviceBackend, HttpBackend};
use crate::channel::StatusChannel;
use crate::command::{self, Command, CommandReply};
use crate::config::{SessionConfig, ShutdownConfig};
use crate::error::CoreError;
use crate::model::{ChannelHealth, RunState, SessionEvent, ShutdownRun, Venue, VenueStatus};
use crate::shutdown::{RunStates, ShutdownOrchestrator};
use crate::stream::StatusStream;

const EVENT_CHANNEL_SIZE: usize = 256;

/// Owning facade for an operator session.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Exactly one venue is selected
/// at a time, and the status channel always follows the selection.
pub struct Session<B: DeviceBackend = HttpBackend> {
    inner: Arc<SessionInner<B>>,
}

impl<B: DeviceBackend> Clone for Session<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<B: DeviceBackend> {
    venues: Vec<Arc<Venue>>,
    backend: Arc<B>,
    channel: StatusChannel<B>,
    orchestrator: ShutdownOrchestrator<B>,
    selected: watch::Sender<Option<Arc<Venue>>>,
    events: broadcast::Sender<SessionEvent>,
    /// Serializes select/deselect so the selection and the channel agree.
    lifecycle: Mutex<()>,
}

impl Session<HttpBackend> {
    /// Create a session talking to the configured HTTP backend.
    pub fn new(config: &SessionConfig, venues: Vec<Venue>) -> Result<Self, CoreError> {
        let backend = HttpBackend::new(config)?;
        Self::with_backend(
            backend,
            venues,
            config.poll_interval,
            config.shutdown.clone(),
        )
    }
}

impl<B: DeviceBackend> Session<B> {
    /// Create a session over any [`DeviceBackend`].
    pub fn with_backend(
        backend: B,
        venues: Vec<Venue>,
        poll_interval: Duration,
        shutdown: ShutdownConfig,
    ) -> Result<Self, CoreError> {
        validate_venues(&venues)?;

        let backend = Arc::new(backend);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (selected, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(SessionInner {
                venues: venues.into_iter().map(Arc::new).collect(),
                channel: StatusChannel::new(Arc::clone(&backend), poll_interval, events.clone()),
                orchestrator: ShutdownOrchestrator::new(
                    Arc::clone(&backend),
                    shutdown,
                    events.clone(),
                ),
                backend,
                selected,
                events,
                lifecycle: Mutex::new(()),
            }),
        })
    }

    // ── Registry ─────────────────────────────────────────────────────

    /// All venues, in registry order.
    pub fn venues(&self) -> &[Arc<Venue>] {
        &self.inner.venues
    }

    pub fn venue(&self, id: &str) -> Result<Arc<Venue>, CoreError> {
        self.inner
            .venues
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownVenue { id: id.to_owned() })
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Select a venue and start its status channel.
    ///
    /// Selecting the already-selected venue changes nothing.
    pub async fn select(&self, id: &str) -> Result<Arc<Venue>, CoreError> {
        let venue = self.venue(id)?;
        let _guard = self.inner.lifecycle.lock().await;

        if self.selected().is_some_and(|current| current.id == venue.id) {
            debug!(venue_id = %venue.id, "venue already selected");
            return Ok(venue);
        }

        self.inner.channel.start(&venue.id).await;
        if let Some(previous) = self.inner.selected.send_replace(Some(Arc::clone(&venue))) {
            self.emit(SessionEvent::VenueDeselected {
                venue_id: previous.id.clone(),
            });
        }
        info!(venue_id = %venue.id, name = %venue.name, "venue selected");
        self.emit(SessionEvent::VenueSelected {
            venue_id: venue.id.clone(),
        });
        Ok(venue)
    }

    /// Clear the selection and stop the status channel. Safe to call with
    /// nothing selected.
    pub async fn deselect(&self) {
        let _guard = self.inner.lifecycle.lock().await;

        self.inner.channel.stop().await;
        if let Some(previous) = self.inner.selected.send_replace(None) {
            info!(venue_id = %previous.id, "venue deselected");
            self.emit(SessionEvent::VenueDeselected {
                venue_id: previous.id.clone(),
            });
        }
    }

    pub fn selected(&self) -> Option<Arc<Venue>> {
        self.inner.selected.borrow().clone()
    }

    pub fn watch_selected(&self) -> watch::Receiver<Option<Arc<Venue>>> {
        self.inner.selected.subscribe()
    }

    fn require_selected(&self) -> Result<Arc<Venue>, CoreError> {
        self.selected().ok_or(CoreError::NoVenueSelected)
    }

    // ── Status ───────────────────────────────────────────────────────

    /// Subscribe to raw snapshots from the status channel.
    pub fn subscribe_status(&self) -> StatusStream {
        self.inner.channel.subscribe()
    }

    /// Latest status of the selected venue, if anything has arrived yet.
    pub fn venue_status(&self) -> Option<VenueStatus> {
        let venue = self.selected()?;
        let snapshot = self.inner.channel.latest()?;
        Some(snapshot.for_venue(&venue))
    }

    pub fn health(&self) -> ChannelHealth {
        self.inner.channel.health()
    }

    pub fn watch_health(&self) -> watch::Receiver<ChannelHealth> {
        self.inner.channel.watch_health()
    }

    /// Subscribe to the session activity feed.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    // ── Shutdown ─────────────────────────────────────────────────────

    /// Run the shutdown sequence for the selected venue.
    ///
    /// The run continues to completion even if this future is dropped.
    pub async fn shutdown(&self) -> Result<ShutdownRun, CoreError> {
        let venue = self.require_selected()?;
        self.inner.orchestrator.run(&venue).await
    }

    /// Run the shutdown sequence for any registered venue.
    pub async fn shutdown_venue(&self, id: &str) -> Result<ShutdownRun, CoreError> {
        let venue = self.venue(id)?;
        self.inner.orchestrator.run(&venue).await
    }

    pub fn run_state(&self, venue_id: &str) -> RunState {
        self.inner.orchestrator.state(venue_id)
    }

    pub fn watch_runs(&self) -> watch::Receiver<RunStates> {
        self.inner.orchestrator.watch()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send a device command to the selected venue.
    pub async fn execute(&self, command: Command) -> Result<CommandReply, CoreError> {
        let venue = self.require_selected()?;
        Ok(self.dispatch(&venue, command).await)
    }

    /// Send a device command to any registered venue.
    pub async fn execute_on(&self, id: &str, command: Command) -> Result<CommandReply, CoreError> {
        let venue = self.venue(id)?;
        Ok(self.dispatch(&venue, command).await)
    }

    async fn dispatch(&self, venue: &Venue, command: Command) -> CommandReply {
        let reply = command::dispatch(self.inner.backend.as_ref(), venue, &command).await;
        info!(
            venue_id = %venue.id,
            command = %command,
            success = reply.is_success(),
            "command completed"
        );
        self.emit(SessionEvent::CommandCompleted {
            venue_id: venue.id.clone(),
            command: command.to_string(),
            reply: reply.clone(),
        });
        reply
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.events.send(event);
    }
}

/// Reject registries with empty or duplicate identifiers.
fn validate_venues(venues: &[Venue]) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for venue in venues {
        if venue.id.trim().is_empty() {
            return Err(CoreError::Config {
                message: "venue id must not be empty".into(),
            });
        }
        if venue.device_id.trim().is_empty() {
            return Err(CoreError::Config {
                message: format!("venue {} has an empty device id", venue.id),
            });
        }
        if !seen.insert(venue.id.as_str()) {
            return Err(CoreError::Config {
                message: format!("duplicate venue id: {}", venue.id),
            });
        }
    }
    Ok(())
}
