//! End-to-end engine behaviour with an in-memory clipboard and a fake
//! provider. Time is paused, so debounce and success windows run instantly,
//! except where a test needs real threads racing each other.

mod support;

use std::sync::Arc;
use std::time::Duration;

use support::{settings_for, FakeTransport, RecordingNotifier};
use textlift_lib::capture::CaptureState;
use textlift_lib::credentials::CredentialResolver;
use textlift_lib::engine::{TriggerReply, TriggerSource};
use textlift_lib::llm::Provider;
use textlift_lib::platform::{Clipboard, MemoryClipboard, NotificationKind, StaticProbe};
use textlift_lib::settings::{AutoModeBehavior, SharedSettings};
use textlift_lib::{App, AppParts};

const OPENAI_OK: &str = r#"{"choices":[{"message":{"content":"Better note"}}]}"#;

fn start(
    settings: SharedSettings,
    clipboard: Arc<dyn Clipboard>,
    transport: Arc<FakeTransport>,
    notifier: Arc<RecordingNotifier>,
) -> App {
    App::start(AppParts {
        settings,
        clipboard,
        notifier,
        transport,
        network: Arc::new(StaticProbe(true)),
        credentials: CredentialResolver::settings_only(),
    })
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn count(notifier: &RecordingNotifier, title: &str) -> usize {
    notifier.titles().iter().filter(|t| t.as_str() == title).count()
}

/// Blocks in `set_text` the way a contended system clipboard can.
struct SlowClipboard {
    inner: MemoryClipboard,
    write_delay: Duration,
}

impl Clipboard for SlowClipboard {
    fn get_text(&self) -> Result<String, String> {
        self.inner.get_text()
    }

    fn set_text(&self, text: &str) -> Result<(), String> {
        std::thread::sleep(self.write_delay);
        self.inner.set_text(text)
    }
}

/// Readable, but every write is refused.
struct LockedClipboard(MemoryClipboard);

impl Clipboard for LockedClipboard {
    fn get_text(&self) -> Result<String, String> {
        self.0.get_text()
    }

    fn set_text(&self, _text: &str) -> Result<(), String> {
        Err("clipboard is locked by another application".into())
    }
}

#[tokio::test(start_paused = true)]
async fn repeated_clipboard_value_is_captured_once() {
    let clipboard = Arc::new(MemoryClipboard::with_text("before start"));
    let transport = Arc::new(FakeTransport::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = settings_for(Provider::OpenAi, "sk-test");
    settings.set_auto_mode(true);
    let app = start(settings, clipboard.clone(), transport.clone(), notifier.clone());

    sleep_ms(100).await;
    clipboard.external_copy("note");
    sleep_ms(1000).await;
    assert_eq!(count(&notifier, "Text Captured"), 1);
    assert_eq!(app.engine.state(), CaptureState::Captured("note".into()));

    // Another app rewrites the clipboard twice inside one debounce window,
    // ending on the value already captured.
    clipboard.external_copy("tmp");
    sleep_ms(200).await;
    clipboard.external_copy("note");
    sleep_ms(1700).await;
    assert_eq!(count(&notifier, "Text Captured"), 1);
    assert_eq!(app.engine.state(), CaptureState::Captured("note".into()));

    // Processing writes the result back; the monitor must not capture it.
    transport.respond(200, OPENAI_OK);
    assert_eq!(
        app.engine.trigger(TriggerSource::Hotkey).await.unwrap(),
        TriggerReply::Started
    );
    sleep_ms(2000).await;
    assert_eq!(clipboard.writes(), vec!["Better note".to_string()]);
    assert_eq!(count(&notifier, "Text Captured"), 1);
    assert_eq!(transport.calls(), 1);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn trigger_is_refused_while_processing() {
    let clipboard = Arc::new(MemoryClipboard::with_text("draft text"));
    let transport = Arc::new(FakeTransport::with_delay(Duration::from_secs(5)));
    transport.respond(200, OPENAI_OK);
    let notifier = Arc::new(RecordingNotifier::default());
    let app = start(
        settings_for(Provider::OpenAi, "sk-test"),
        clipboard.clone(),
        transport.clone(),
        notifier.clone(),
    );

    assert_eq!(
        app.engine.trigger(TriggerSource::Hotkey).await.unwrap(),
        TriggerReply::Started
    );
    assert_eq!(
        app.engine.state(),
        CaptureState::Processing("draft text".into())
    );
    sleep_ms(10).await;

    assert_eq!(
        app.engine.trigger(TriggerSource::Menu).await.unwrap(),
        TriggerReply::Busy
    );
    assert_eq!(transport.calls(), 1);

    sleep_ms(6000).await;
    assert_eq!(app.engine.state(), CaptureState::Succeeded);
    assert_eq!(clipboard.get_text().unwrap(), "Better note");
    assert_eq!(count(&notifier, "Text Enhanced"), 1);

    sleep_ms(3000).await;
    assert_eq!(app.engine.state(), CaptureState::Idle);
    assert_eq!(transport.calls(), 1);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn empty_clipboard_reports_no_text() {
    let clipboard = Arc::new(MemoryClipboard::default());
    let transport = Arc::new(FakeTransport::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let app = start(
        settings_for(Provider::Anthropic, "ak"),
        clipboard,
        transport.clone(),
        notifier.clone(),
    );

    assert_eq!(
        app.engine.trigger(TriggerSource::Hotkey).await.unwrap(),
        TriggerReply::NoText
    );
    assert_eq!(app.engine.state(), CaptureState::Idle);
    assert_eq!(count(&notifier, "No Text Available"), 1);
    assert_eq!(transport.calls(), 0);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failure_returns_to_idle_with_one_notification() {
    let clipboard = Arc::new(MemoryClipboard::with_text("text to fix"));
    let transport = Arc::new(FakeTransport::new());
    transport.respond(503, "");
    let notifier = Arc::new(RecordingNotifier::default());
    let app = start(
        settings_for(Provider::Anthropic, "ak"),
        clipboard.clone(),
        transport,
        notifier.clone(),
    );
    let mut transitions = app.engine.transitions();

    app.engine.trigger(TriggerSource::Hotkey).await.unwrap();
    let mut seen = Vec::new();
    loop {
        let state = transitions.recv().await.unwrap();
        let settled = state == CaptureState::Idle;
        seen.push(state);
        if settled {
            break;
        }
    }

    let errors: Vec<_> = notifier
        .all()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "API Error");
    assert!(errors[0].body.contains("Anthropic server error"));
    assert_eq!(
        seen,
        vec![
            CaptureState::Processing("text to fix".into()),
            CaptureState::Failed(errors[0].body.clone()),
            CaptureState::Idle,
        ]
    );
    assert!(clipboard.writes().is_empty());

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn process_immediately_variant_runs_without_trigger() {
    let clipboard = Arc::new(MemoryClipboard::default());
    let transport = Arc::new(FakeTransport::new());
    transport.respond(200, OPENAI_OK);
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = settings_for(Provider::OpenAi, "sk-test");
    settings.set_auto_mode(true);
    settings.set_auto_mode_behavior(AutoModeBehavior::ProcessImmediately);
    let app = start(settings, clipboard.clone(), transport.clone(), notifier.clone());

    sleep_ms(100).await;
    clipboard.external_copy("rough draft");
    sleep_ms(2000).await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(clipboard.writes(), vec!["Better note".to_string()]);
    assert_eq!(count(&notifier, "Text Captured"), 0);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn captures_are_ignored_with_auto_mode_off() {
    let clipboard = Arc::new(MemoryClipboard::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = settings_for(Provider::OpenAi, "sk-test");
    let app = start(
        settings.clone(),
        clipboard,
        Arc::new(FakeTransport::new()),
        notifier.clone(),
    );

    app.engine.clipboard_captured("ignored".into()).await.unwrap();
    sleep_ms(10).await;
    assert_eq!(app.engine.state(), CaptureState::Idle);

    app.engine.toggle_auto_mode().await.unwrap();
    app.engine.clipboard_captured("kept".into()).await.unwrap();
    sleep_ms(10).await;
    assert!(settings.snapshot().auto_mode);
    assert_eq!(app.engine.state(), CaptureState::Captured("kept".into()));
    assert_eq!(count(&notifier, "Auto Mode Enabled"), 1);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn capture_held_while_busy_runs_after_settling() {
    let clipboard = Arc::new(MemoryClipboard::default());
    let transport = Arc::new(FakeTransport::with_delay(Duration::from_secs(2)));
    transport.respond(200, OPENAI_OK);
    transport.respond(200, OPENAI_OK);
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = settings_for(Provider::OpenAi, "sk-test");
    settings.set_auto_mode(true);
    settings.set_auto_mode_behavior(AutoModeBehavior::ProcessImmediately);
    let app = start(settings, clipboard.clone(), transport.clone(), notifier.clone());

    sleep_ms(100).await;
    clipboard.external_copy("rough draft");
    sleep_ms(1000).await;
    assert_eq!(
        app.engine.state(),
        CaptureState::Processing("rough draft".into())
    );

    // Copied while the first request is in flight.
    clipboard.external_copy("second draft");
    sleep_ms(12_000).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert!(body.to_string().contains("second draft"));
    assert_eq!(count(&notifier, "Text Enhanced"), 2);
    assert_eq!(app.engine.state(), CaptureState::Idle);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn refused_write_back_leaves_clipboard_baseline_alone() {
    let clipboard = Arc::new(LockedClipboard(MemoryClipboard::with_text("rough draft")));
    let transport = Arc::new(FakeTransport::new());
    transport.respond(200, OPENAI_OK);
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = settings_for(Provider::OpenAi, "sk-test");
    settings.set_auto_mode(true);
    let app = start(settings, clipboard, transport.clone(), notifier.clone());

    assert_eq!(
        app.engine.trigger(TriggerSource::Hotkey).await.unwrap(),
        TriggerReply::Started
    );
    sleep_ms(2000).await;

    assert_eq!(count(&notifier, "Clipboard Error"), 1);
    // The user's own text is still on the clipboard; it is not a new copy.
    assert_eq!(count(&notifier, "Text Captured"), 0);
    assert_eq!(app.engine.state(), CaptureState::Idle);
    assert_eq!(transport.calls(), 1);

    app.shutdown().await;
}

// Real time on two worker threads: the monitor polls while the engine is
// stuck inside `set_text`.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_write_back_is_not_captured_as_a_copy() {
    let clipboard = Arc::new(SlowClipboard {
        inner: MemoryClipboard::with_text("rough draft"),
        write_delay: Duration::from_millis(700),
    });
    let transport = Arc::new(FakeTransport::new());
    transport.respond(200, OPENAI_OK);
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = settings_for(Provider::OpenAi, "sk-test");
    settings.set_auto_mode(true);
    let app = start(settings, clipboard.clone(), transport.clone(), notifier.clone());

    sleep_ms(300).await;
    assert_eq!(
        app.engine.trigger(TriggerSource::Hotkey).await.unwrap(),
        TriggerReply::Started
    );

    // Write-back, then the success window, then some polls.
    sleep_ms(4500).await;
    assert_eq!(clipboard.inner.writes(), vec!["Better note".to_string()]);
    assert_eq!(app.engine.state(), CaptureState::Idle);
    assert_eq!(count(&notifier, "Text Captured"), 0);
    assert_eq!(transport.calls(), 1);

    app.shutdown().await;
}
