//! Capture → process → deliver state machine.
//!
//! Pure: no clipboard, network or timers. The engine feeds it events and
//! performs the side effects it asks for. At most one request is in
//! flight; a trigger while `Processing` is refused.

use super::CaptureState;

/// What a trigger led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Now `Processing` this text under the given generation.
    Start { text: String, generation: u64 },
    /// A request is already in flight.
    Busy,
    /// Nothing captured and the clipboard is empty. State unchanged.
    NoText,
}

#[derive(Debug, Default)]
pub struct CaptureStateMachine {
    state: CaptureState,
    /// Text copied while busy; becomes the capture once the machine settles.
    pending: Option<String>,
    generation: u64,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A committed clipboard value. Most recent wins; blank text is ignored.
    /// Returns true when the visible state changed.
    pub fn on_clipboard_change(&mut self, text: String) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        match self.state {
            CaptureState::Idle | CaptureState::Captured(_) | CaptureState::Failed(_) => {
                self.state = CaptureState::Captured(text);
                true
            }
            CaptureState::Processing(_) | CaptureState::Succeeded => {
                self.pending = Some(text);
                false
            }
        }
    }

    /// Hotkey or auto-mode trigger. `clipboard` is only consulted when
    /// nothing has been captured.
    pub fn on_trigger(&mut self, clipboard: impl FnOnce() -> Option<String>) -> TriggerOutcome {
        let text = match &mut self.state {
            CaptureState::Processing(_) => return TriggerOutcome::Busy,
            CaptureState::Captured(text) => std::mem::take(text),
            CaptureState::Succeeded => match self.pending.take() {
                Some(text) => text,
                None => match non_blank(clipboard()) {
                    Some(text) => text,
                    None => return TriggerOutcome::NoText,
                },
            },
            CaptureState::Idle | CaptureState::Failed(_) => match non_blank(clipboard()) {
                Some(text) => text,
                None => return TriggerOutcome::NoText,
            },
        };
        self.generation += 1;
        self.state = CaptureState::Processing(text.clone());
        TriggerOutcome::Start {
            text,
            generation: self.generation,
        }
    }

    /// Result of the in-flight request. Stale generations are ignored.
    pub fn on_success(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state = CaptureState::Succeeded;
        true
    }

    /// `reason` is what the user is shown.
    pub fn on_failure(&mut self, generation: u64, reason: impl Into<String>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state = CaptureState::Failed(reason.into());
        true
    }

    /// End of the success display window for `generation`.
    pub fn on_success_window_elapsed(&mut self, generation: u64) -> bool {
        if self.state != CaptureState::Succeeded || generation != self.generation {
            return false;
        }
        self.settle();
        true
    }

    /// Leave `Failed` or `Succeeded`: to `Captured` if text arrived while
    /// busy, else `Idle`.
    pub fn settle(&mut self) {
        if !matches!(self.state, CaptureState::Failed(_) | CaptureState::Succeeded) {
            return;
        }
        self.state = match self.pending.take() {
            Some(text) => CaptureState::Captured(text),
            None => CaptureState::Idle,
        };
    }

    /// True while `generation` is the request being processed.
    pub fn is_in_flight(&self, generation: u64) -> bool {
        self.is_current(generation)
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(self.state, CaptureState::Processing(_)) && generation == self.generation
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}
