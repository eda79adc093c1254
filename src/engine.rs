//! The engine task: single owner of the capture state.
//!
//! Front-ends talk to it through `EngineHandle` (hotkeys, tray clicks,
//! clipboard captures). Provider calls run on their own tasks and report
//! back through an internal channel, so state is only ever mutated here.
//! Every state change is published on a `watch` channel (latest value) and
//! a `broadcast` channel (each transition in order, so short-lived states
//! such as `Failed` are not coalesced away).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::capture::{CaptureState, CaptureStateMachine, ChangeTracker, TriggerOutcome};
use crate::error::EnhanceError;
use crate::pipeline::RequestPipeline;
use crate::platform::{Clipboard, Notification, NotificationKind, Notifier};
use crate::settings::{AutoModeBehavior, SharedSettings};

pub const SUCCESS_WINDOW: Duration = Duration::from_secs(3);
const COMMAND_BUFFER: usize = 32;
const TRANSITION_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Hotkey,
    Menu,
    AutoMode,
}

/// Answer to an explicit trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReply {
    Started,
    Busy,
    NoText,
}

#[derive(Debug)]
pub enum Command {
    ClipboardCaptured(String),
    Trigger {
        source: TriggerSource,
        reply: Option<oneshot::Sender<TriggerReply>>,
    },
    SetAutoMode(bool),
    ToggleAutoMode,
    Shutdown,
}

enum Internal {
    Finished {
        generation: u64,
        result: Result<String, EnhanceError>,
    },
    SuccessWindowElapsed(u64),
}

#[derive(Debug, thiserror::Error)]
#[error("Engine is not running")]
pub struct EngineClosed;

/// Collaborators the engine drives.
pub struct EngineParts {
    pub pipeline: Arc<RequestPipeline>,
    pub clipboard: Arc<dyn Clipboard>,
    pub notifier: Arc<dyn Notifier>,
    pub tracker: Arc<Mutex<ChangeTracker>>,
    pub success_window: Duration,
}

#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<CaptureState>,
    transitions: broadcast::Sender<CaptureState>,
}

impl EngineHandle {
    pub async fn trigger(&self, source: TriggerSource) -> Result<TriggerReply, EngineClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Trigger {
            source,
            reply: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| EngineClosed)
    }

    pub async fn clipboard_captured(&self, text: String) -> Result<(), EngineClosed> {
        self.send(Command::ClipboardCaptured(text)).await
    }

    /// Non-blocking variant for the clipboard monitor callback.
    pub fn try_clipboard_captured(&self, text: String) -> bool {
        match self.commands.try_send(Command::ClipboardCaptured(text)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("[ENGINE] Command queue full, dropping clipboard capture");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub async fn set_auto_mode(&self, enabled: bool) -> Result<(), EngineClosed> {
        self.send(Command::SetAutoMode(enabled)).await
    }

    pub async fn toggle_auto_mode(&self) -> Result<(), EngineClosed> {
        self.send(Command::ToggleAutoMode).await
    }

    pub async fn shutdown(&self) -> Result<(), EngineClosed> {
        self.send(Command::Shutdown).await
    }

    pub fn state(&self) -> CaptureState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.clone()
    }

    /// Every state published from now on, in order.
    pub fn transitions(&self) -> broadcast::Receiver<CaptureState> {
        self.transitions.subscribe()
    }

    async fn send(&self, command: Command) -> Result<(), EngineClosed> {
        self.commands.send(command).await.map_err(|_| EngineClosed)
    }
}

pub struct Engine {
    machine: CaptureStateMachine,
    settings: SharedSettings,
    parts: EngineParts,
    state_tx: watch::Sender<CaptureState>,
    transitions_tx: broadcast::Sender<CaptureState>,
    internal_tx: mpsc::UnboundedSender<Internal>,
}

impl Engine {
    /// Start the engine task.
    pub fn spawn(parts: EngineParts) -> (EngineHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(CaptureState::Idle);
        let (transitions_tx, _) = broadcast::channel(TRANSITION_BUFFER);

        let engine = Engine {
            machine: CaptureStateMachine::new(),
            settings: parts.pipeline.settings().clone(),
            parts,
            state_tx,
            transitions_tx: transitions_tx.clone(),
            internal_tx,
        };
        let task = tokio::spawn(engine.run(commands_rx, internal_rx));
        let handle = EngineHandle {
            commands: commands_tx,
            state: state_rx,
            transitions: transitions_tx,
        };
        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
    ) {
        log::info!("[ENGINE] Started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = internal.recv() => self.handle_internal(event),
            }
        }
        log::info!("[ENGINE] Stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::ClipboardCaptured(text) => self.on_capture(text),
            Command::Trigger { source, reply } => {
                let outcome = self.trigger(source);
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
            Command::SetAutoMode(enabled) => {
                self.settings.set_auto_mode(enabled);
                self.announce_auto_mode(enabled);
            }
            Command::ToggleAutoMode => {
                let enabled = self.settings.toggle_auto_mode();
                self.announce_auto_mode(enabled);
            }
            Command::Shutdown => {}
        }
    }

    fn on_capture(&mut self, text: String) {
        if !self.settings.read(|s| s.auto_mode) {
            log::debug!("[ENGINE] Auto-mode off, ignoring clipboard capture");
            return;
        }
        if !self.machine.on_clipboard_change(text) {
            log::debug!("[ENGINE] Capture held until {} settles", self.machine.state().label());
            return;
        }
        self.publish();
        self.act_on_capture();
    }

    /// The machine is in `Captured`: notify, or start right away under
    /// `ProcessImmediately`.
    fn act_on_capture(&mut self) {
        let (behavior, hotkey) = self
            .settings
            .read(|s| (s.auto_mode_behavior, s.hotkeys.process_text.to_string()));
        match behavior {
            AutoModeBehavior::NotifyOnly => self.notify(Notification::new(
                NotificationKind::Info,
                "Text Captured",
                format!("Press {} to enhance the copied text.", hotkey),
            )),
            AutoModeBehavior::ProcessImmediately => {
                self.trigger(TriggerSource::AutoMode);
            }
        }
    }

    fn trigger(&mut self, source: TriggerSource) -> TriggerReply {
        let clipboard = self.parts.clipboard.clone();
        let outcome = self.machine.on_trigger(|| match clipboard.get_text() {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("[CLIPBOARD] Failed to read clipboard: {}", e);
                None
            }
        });

        match outcome {
            TriggerOutcome::Busy => {
                log::info!("[ENGINE] Trigger ({:?}) ignored, request already in flight", source);
                TriggerReply::Busy
            }
            TriggerOutcome::NoText => {
                self.report_failure(&EnhanceError::NoTextAvailable);
                TriggerReply::NoText
            }
            TriggerOutcome::Start { text, generation } => {
                log::info!(
                    "[ENGINE] Trigger ({:?}): processing {} chars",
                    source,
                    text.len()
                );
                self.publish();
                let provider = self.settings.read(|s| s.provider);
                self.notify(Notification::new(
                    NotificationKind::Info,
                    "Processing",
                    format!("Processing text with {}...", provider.display_name()),
                ));

                let pipeline = self.parts.pipeline.clone();
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    let result = pipeline.process(&text).await;
                    let _ = tx.send(Internal::Finished { generation, result });
                });
                TriggerReply::Started
            }
        }
    }

    fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::Finished { generation, result } => self.on_finished(generation, result),
            Internal::SuccessWindowElapsed(generation) => {
                if self.machine.on_success_window_elapsed(generation) {
                    self.publish();
                    self.resume_held_capture();
                }
            }
        }
    }

    fn on_finished(&mut self, generation: u64, result: Result<String, EnhanceError>) {
        if !self.machine.is_in_flight(generation) {
            log::debug!("[ENGINE] Dropping stale result for request {}", generation);
            return;
        }
        let delivered = result.and_then(|text| self.write_back(&text).map(|_| text));

        match delivered {
            Ok(text) => {
                if !self.machine.on_success(generation) {
                    return;
                }
                log::info!("[ENGINE] Enhanced text ready ({} chars)", text.len());
                self.publish();
                self.notify(Notification::new(
                    NotificationKind::Success,
                    "Text Enhanced",
                    "The improved text is on your clipboard.",
                ));

                let tx = self.internal_tx.clone();
                let window = self.parts.success_window;
                tokio::spawn(async move {
                    tokio::time::sleep(window).await;
                    let _ = tx.send(Internal::SuccessWindowElapsed(generation));
                });
            }
            Err(err) => {
                if !self.machine.on_failure(generation, err.user_message()) {
                    return;
                }
                self.publish();
                self.report_failure(&err);
                self.machine.settle();
                self.publish();
                self.resume_held_capture();
            }
        }
    }

    /// After settling, a capture that arrived while busy is treated like a
    /// fresh one.
    fn resume_held_capture(&mut self) {
        if !matches!(self.machine.state(), CaptureState::Captured(_)) {
            return;
        }
        if !self.settings.read(|s| s.auto_mode) {
            return;
        }
        log::info!("[ENGINE] Resuming capture held while busy");
        self.act_on_capture();
    }

    /// Put the result on the clipboard without the monitor seeing it as a copy.
    fn write_back(&self, text: &str) -> Result<(), EnhanceError> {
        let clipboard = &self.parts.clipboard;
        self.parts
            .tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .write_own(text, move || clipboard.set_text(text))
            .map_err(EnhanceError::Clipboard)
    }

    /// One log line and one notification per failure. Error notifications
    /// ignore the "show notifications" preference.
    fn report_failure(&self, err: &EnhanceError) {
        log::error!("[ENGINE] {}: {}", err.title(), err);
        let sound = self.settings.read(|s| s.notifications.play_sounds);
        self.parts.notifier.notify(
            Notification::new(NotificationKind::Error, err.title(), err.user_message())
                .with_sound(sound),
        );
    }

    fn announce_auto_mode(&self, enabled: bool) {
        log::info!("[ENGINE] Auto-mode {}", if enabled { "enabled" } else { "disabled" });
        let body = if enabled {
            "Copied text will be captured automatically."
        } else {
            "Clipboard is no longer watched."
        };
        let title = if enabled { "Auto Mode Enabled" } else { "Auto Mode Disabled" };
        self.notify(Notification::new(NotificationKind::Info, title, body));
    }

    /// Informational notices respect the notification preferences.
    fn notify(&self, notification: Notification) {
        let prefs = self.settings.read(|s| s.notifications);
        if !prefs.show_notifications {
            return;
        }
        self.parts
            .notifier
            .notify(notification.with_sound(prefs.play_sounds));
    }

    fn publish(&self) {
        let state = self.machine.state().clone();
        log::debug!("[ENGINE] State -> {}", state.label());
        // No subscribers is fine.
        let _ = self.transitions_tx.send(state.clone());
        self.state_tx.send_replace(state);
    }
}
