// ── Domain model ──

pub mod event;
pub mod shutdown;
pub mod status;
pub mod venue;

pub use event::SessionEvent;
pub use shutdown::{RunOutcome, RunState, ShutdownRun, StepName, StepOutcome, StepResult};
pub use status::{
    AudioStatus, ChannelHealth, DeviceStatus, DowserState, LampState, LiveStatusSnapshot,
    PlaybackState, UpdateSource, VenueStatus,
};
pub use venue::{Protocol, Venue};
