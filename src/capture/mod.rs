//! Clipboard capture domain: public API.
//!
//! - machine.rs  the capture/process/deliver state machine
//! - debounce.rs  change tracking and debouncing
//! - monitor.rs  background polling task

mod debounce;
mod machine;
mod monitor;

pub use debounce::{ChangeTracker, Debouncer, Observation, DEBOUNCE_DELAY};
pub use machine::{CaptureStateMachine, TriggerOutcome};
pub use monitor::{ClipboardMonitor, POLL_INTERVAL};

/// Visible state, broadcast to tray front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    /// Text waiting for a trigger.
    Captured(String),
    /// The text sent to the provider.
    Processing(String),
    /// Result is on the clipboard; shown for a short window.
    Succeeded,
    /// User-facing reason. Published once, then the machine settles.
    Failed(String),
}

impl CaptureState {
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Captured(_) => "captured",
            CaptureState::Processing(_) => "processing",
            CaptureState::Succeeded => "succeeded",
            CaptureState::Failed(_) => "failed",
        }
    }
}
