// ── Shutdown run domain types ──

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};

/// The five shutdown steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    #[strum(serialize = "stop playback")]
    StopPlayback,
    #[strum(serialize = "close shutter")]
    CloseShutter,
    #[strum(serialize = "lamp off")]
    LampOff,
    #[strum(serialize = "audio level")]
    AudioLevel,
    #[strum(serialize = "audio input mode")]
    AudioInputMode,
}

impl StepName {
    /// All steps in execution order.
    pub fn sequence() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Steps that address the audio processor and are skipped without one.
    pub fn needs_audio(self) -> bool {
        matches!(self, Self::AudioLevel | Self::AudioInputMode)
    }

    /// 1-based position in the sequence.
    pub fn ordinal(self) -> usize {
        Self::iter().position(|s| s == self).map_or(0, |i| i + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Failure,
    Skipped,
}

/// Recorded outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub name: StepName,
    /// `false` only for skipped steps.
    pub attempted: bool,
    pub outcome: StepOutcome,
    pub message: Option<String>,
}

impl StepResult {
    pub fn skipped(name: StepName, reason: &str) -> Self {
        Self {
            name,
            attempted: false,
            outcome: StepOutcome::Skipped,
            message: Some(reason.to_owned()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == StepOutcome::Failure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    #[strum(serialize = "success")]
    Success,
    #[strum(serialize = "completed with errors")]
    CompletedWithErrors,
}

/// Progress of a venue's shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running { step: StepName },
    Completed { outcome: RunOutcome },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// A finished shutdown run. Covers every step, attempted or skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownRun {
    pub venue_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepResult>,
}

impl ShutdownRun {
    /// `Success` iff every attempted step succeeded.
    pub fn outcome(&self) -> RunOutcome {
        if self.steps.iter().any(StepResult::is_failure) {
            RunOutcome::CompletedWithErrors
        } else {
            RunOutcome::Success
        }
    }

    pub fn attempted(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| s.attempted)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| s.is_failure())
    }
}
