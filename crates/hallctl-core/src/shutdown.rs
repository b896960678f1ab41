// ── Shutdown orchestration ──
//
// Runs the end-of-session sequence for a venue:
//
//   1. stop playback          (primary device)
//   2. close shutter          (primary device)
//   3. lamp off               (primary device)
//   4. audio level -> safe    (audio processor, if configured)
//   5. audio input -> non-sync (audio processor, if configured)
//
// Steps run strictly in order and every applicable step is attempted
// exactly once, whatever happened before it. Steps 4-5 are recorded as
// skipped for a venue without an audio processor. Once a run has claimed
// its venue it executes on its own task, so dropping the caller's future
// never cuts the sequence short.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::backend::DeviceBackend;
use crate::command::{self, Command, CommandReply};
use crate::config::ShutdownConfig;
use crate::error::CoreError;
use crate::model::{
    RunOutcome, RunState, SessionEvent, ShutdownRun, StepName, StepOutcome, StepResult, Venue,
};

const NO_AUDIO: &str = "no audio processor configured";

/// Per-venue run state, keyed by venue id.
pub type RunStates = HashMap<String, RunState>;

/// Executes shutdown runs. At most one run per venue at a time.
pub struct ShutdownOrchestrator<B: DeviceBackend> {
    inner: Arc<OrchestratorInner<B>>,
}

struct OrchestratorInner<B: DeviceBackend> {
    backend: Arc<B>,
    config: ShutdownConfig,
    runs: Arc<watch::Sender<RunStates>>,
    events: broadcast::Sender<SessionEvent>,
}

impl<B: DeviceBackend> ShutdownOrchestrator<B> {
    pub fn new(
        backend: Arc<B>,
        config: ShutdownConfig,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let (runs, _) = watch::channel(RunStates::new());
        Self {
            inner: Arc::new(OrchestratorInner {
                backend,
                config,
                runs: Arc::new(runs),
                events,
            }),
        }
    }

    pub fn config(&self) -> &ShutdownConfig {
        &self.inner.config
    }

    /// Current run state for a venue (`Idle` if it never ran).
    pub fn state(&self, venue_id: &str) -> RunState {
        self.inner
            .runs
            .borrow()
            .get(venue_id)
            .copied()
            .unwrap_or_default()
    }

    /// Observe run progress for all venues.
    pub fn watch(&self) -> watch::Receiver<RunStates> {
        self.inner.runs.subscribe()
    }

    /// Run the full sequence for `venue` and wait for its result.
    ///
    /// [`CoreError::ShutdownInProgress`] is returned before anything is
    /// sent. Device failures are recorded in the returned run. The sequence
    /// itself runs on a spawned task: if this future is dropped, the run
    /// still attempts every step and reaches `Completed`.
    pub async fn run(&self, venue: &Venue) -> Result<ShutdownRun, CoreError> {
        let slot = claim(&self.inner.runs, &venue.id)?;
        let inner = Arc::clone(&self.inner);
        let venue = venue.clone();
        let venue_id = venue.id.clone();

        tokio::spawn(async move { inner.execute(&venue, slot).await })
            .await
            .map_err(|e| {
                error!(venue_id = %venue_id, error = %e, "shutdown task failed");
                CoreError::Internal(format!("shutdown task for {venue_id} failed: {e}"))
            })
    }
}

impl<B: DeviceBackend> OrchestratorInner<B> {
    async fn execute(&self, venue: &Venue, slot: RunSlot) -> ShutdownRun {
        let started_at = Utc::now();

        info!(venue_id = %venue.id, "shutdown started");
        self.emit(SessionEvent::ShutdownStarted {
            venue_id: venue.id.clone(),
        });

        let mut steps = Vec::with_capacity(StepName::sequence().count());
        let mut dispatched = false;

        for name in StepName::sequence() {
            let result = match self.command_for(name, venue) {
                None => {
                    debug!(venue_id = %venue.id, step = %name, "shutdown step skipped");
                    StepResult::skipped(name, NO_AUDIO)
                }
                Some(command) => {
                    if dispatched && !self.config.step_delay.is_zero() {
                        tokio::time::sleep(self.config.step_delay).await;
                    }
                    dispatched = true;
                    slot.set(RunState::Running { step: name });

                    let reply = command::dispatch(self.backend.as_ref(), venue, &command).await;
                    step_result(name, reply)
                }
            };

            if result.is_failure() {
                warn!(
                    venue_id = %venue.id,
                    step = %name,
                    cause = result.message.as_deref().unwrap_or("unknown"),
                    "shutdown step failed"
                );
            } else if result.outcome == StepOutcome::Success {
                debug!(venue_id = %venue.id, step = %name, "shutdown step succeeded");
            }

            self.emit(SessionEvent::ShutdownStep {
                venue_id: venue.id.clone(),
                result: result.clone(),
            });
            steps.push(result);
        }

        let run = ShutdownRun {
            venue_id: venue.id.clone(),
            started_at,
            finished_at: Utc::now(),
            steps,
        };
        let outcome = run.outcome();
        slot.complete(outcome);

        info!(
            venue_id = %venue.id,
            outcome = %outcome,
            failed = run.failures().count(),
            "shutdown finished"
        );
        self.emit(SessionEvent::ShutdownCompleted {
            venue_id: venue.id.clone(),
            outcome,
        });

        run
    }

    /// The command for a step, or `None` when the step does not apply.
    fn command_for(&self, step: StepName, venue: &Venue) -> Option<Command> {
        if step.needs_audio() && !venue.has_audio() {
            return None;
        }
        Some(match step {
            StepName::StopPlayback => Command::Stop,
            StepName::CloseShutter => Command::Dowser { closed: true },
            StepName::LampOff => Command::Lamp { on: false },
            StepName::AudioLevel => Command::AudioLevel {
                value: self.config.audio_level,
                force: true,
            },
            StepName::AudioInputMode => Command::AudioInputMode {
                mode: self.config.audio_input_mode.clone(),
            },
        })
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Mark the venue as running, or reject if it already is.
fn claim(runs: &Arc<watch::Sender<RunStates>>, venue_id: &str) -> Result<RunSlot, CoreError> {
    let mut claimed = false;
    runs.send_if_modified(|runs| {
        let state = runs.entry(venue_id.to_owned()).or_default();
        if state.is_running() {
            return false;
        }
        *state = RunState::Running {
            step: StepName::StopPlayback,
        };
        claimed = true;
        true
    });

    if !claimed {
        warn!(venue_id, "shutdown rejected, a run is already in progress");
        return Err(CoreError::ShutdownInProgress {
            venue_id: venue_id.to_owned(),
        });
    }
    Ok(RunSlot {
        runs: Arc::clone(runs),
        venue_id: venue_id.to_owned(),
        completed: false,
    })
}

fn step_result(name: StepName, reply: CommandReply) -> StepResult {
    StepResult {
        name,
        attempted: true,
        outcome: if reply.is_success() {
            StepOutcome::Success
        } else {
            StepOutcome::Failure
        },
        message: reply.message,
    }
}

/// A claimed venue. Releases the claim if the run task panics before
/// completing.
struct RunSlot {
    runs: Arc<watch::Sender<RunStates>>,
    venue_id: String,
    completed: bool,
}

impl RunSlot {
    fn set(&self, state: RunState) {
        self.runs.send_modify(|runs| {
            runs.insert(self.venue_id.clone(), state);
        });
    }

    fn complete(mut self, outcome: RunOutcome) {
        self.set(RunState::Completed { outcome });
        self.completed = true;
    }
}

impl Drop for RunSlot {
    fn drop(&mut self) {
        if !self.completed {
            self.set(RunState::Idle);
        }
    }
}
