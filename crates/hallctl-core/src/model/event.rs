// ── Session activity feed ──

use serde::Serialize;

use super::shutdown::{RunOutcome, StepResult};
use crate::command::CommandReply;

/// Activity broadcast by a [`Session`](crate::Session).
///
/// Receivers that fall behind lose the oldest events (broadcast semantics);
/// nothing in the core waits on them.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    VenueSelected {
        venue_id: String,
    },
    VenueDeselected {
        venue_id: String,
    },
    /// The push channel failed; status continues on the poll alone.
    PushDegraded {
        venue_id: String,
        reason: String,
    },
    ShutdownStarted {
        venue_id: String,
    },
    ShutdownStep {
        venue_id: String,
        result: StepResult,
    },
    ShutdownCompleted {
        venue_id: String,
        outcome: RunOutcome,
    },
    CommandCompleted {
        venue_id: String,
        command: String,
        reply: CommandReply,
    },
}

impl SessionEvent {
    pub fn venue_id(&self) -> &str {
        match self {
            Self::VenueSelected { venue_id }
            | Self::VenueDeselected { venue_id }
            | Self::PushDegraded { venue_id, .. }
            | Self::ShutdownStarted { venue_id }
            | Self::ShutdownStep { venue_id, .. }
            | Self::ShutdownCompleted { venue_id, .. }
            | Self::CommandCompleted { venue_id, .. } => venue_id,
        }
    }
}
