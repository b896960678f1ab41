//! Status synchronization and command orchestration between `hallctl-api`
//! and operator front ends.
//!
//! - **[`Session`]**: Owning facade for one operator session. Holds the
//!   venue registry, the selected venue, the live-status channel, and the
//!   shutdown orchestrator. [`select()`](Session::select) activates the
//!   status channel for a venue; [`deselect()`](Session::deselect) stops it.
//!
//! - **[`StatusChannel`]**: Server push plus an unconditional fallback poll,
//!   both writing the same snapshot (last write wins). A failed push channel
//!   is never re-opened; health flips to degraded and the poll carries on.
//!
//! - **[`reconcile`]**: Pure mapping from raw backend payloads (current and
//!   legacy field schemes) to the canonical [`LiveStatusSnapshot`].
//!
//! - **[`ShutdownOrchestrator`]**: Ordered end-of-session sequence (stop,
//!   shutter, lamp, audio level, audio input) that attempts every step and
//!   records a [`StepResult`] for each.
//!
//! - **[`DeviceBackend`]**: The seam between orchestration and transport.
//!   [`HttpBackend`] drives the real backend; tests substitute scripted
//!   fakes.

pub mod backend;
pub mod channel;
pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod session;
pub mod shutdown;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{DeviceBackend, HttpBackend};
pub use channel::StatusChannel;
pub use command::{Command, CommandReply, FailureKind};
pub use config::{PushMode, SessionConfig, ShutdownConfig};
pub use error::CoreError;
pub use reconcile::{UNKNOWN, format_duration, reconcile_snapshot};
pub use session::Session;
pub use shutdown::ShutdownOrchestrator;
pub use stream::StatusStream;

pub use model::{
    AudioStatus, ChannelHealth, DeviceStatus, DowserState, LampState, LiveStatusSnapshot,
    PlaybackState, Protocol, RunOutcome, RunState, SessionEvent, ShutdownRun, StepName,
    StepOutcome, StepResult, UpdateSource, Venue, VenueStatus,
};
