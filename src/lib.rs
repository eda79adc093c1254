//! textlift: clipboard text enhancement through a cloud LLM provider.
//!
//! This is the library root that wires the domains together. No business
//! logic lives here, only module declarations and startup helpers.
//!
//! Domains:
//!   - llm/  provider adapters, response extraction, HTTP seam
//!   - pipeline.rs  one provider call per invocation
//!   - capture/  capture state machine, debounce, clipboard monitor
//!   - engine.rs  the task that owns capture state
//!   - settings.rs  persisted settings, prompt collection
//!   - platform/  clipboard, notifications, network probe

pub mod capture;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod platform;
pub mod prompt_store;
pub mod settings;

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use capture::{ChangeTracker, ClipboardMonitor};
use credentials::CredentialResolver;
use engine::{Engine, EngineHandle, EngineParts, SUCCESS_WINDOW};
use llm::{HttpTransport, ReqwestTransport};
use pipeline::RequestPipeline;
use platform::{Clipboard, InterfaceProbe, LogNotifier, NetworkProbe, Notifier, SystemClipboard};
use settings::{JsonFileStore, SharedSettings};

/// Load `.env.local`, falling back to `.env`, from the working directory
/// and then the settings directory. The first file found wins.
///
/// Runs before logging is initialised, so it reports on stderr.
pub fn load_env_files() {
    let mut roots = vec![std::env::current_dir().unwrap_or_default()];
    if let Some(parent) = JsonFileStore::default_location().path().parent() {
        roots.push(parent.to_path_buf());
    }

    for root in roots {
        for env_file in [".env.local", ".env"] {
            let path = root.join(env_file);
            if !path.exists() {
                continue;
            }
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            return;
        }
    }
}

/// `RUST_LOG` controls verbosity; defaults to `info`.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Collaborators for a running instance.
pub struct AppParts {
    pub settings: SharedSettings,
    pub clipboard: Arc<dyn Clipboard>,
    pub notifier: Arc<dyn Notifier>,
    pub transport: Arc<dyn HttpTransport>,
    pub network: Arc<dyn NetworkProbe>,
    pub credentials: CredentialResolver,
}

impl AppParts {
    /// Real clipboard, log notifications, reqwest, settings from disk.
    pub fn system() -> Self {
        let store = Arc::new(JsonFileStore::default_location());
        log::info!("[STARTUP] Settings file: {}", store.path().display());
        Self {
            settings: SharedSettings::load_with_env(store),
            clipboard: Arc::new(SystemClipboard),
            notifier: Arc::new(LogNotifier),
            transport: Arc::new(ReqwestTransport::new()),
            network: Arc::new(InterfaceProbe::default()),
            credentials: CredentialResolver::default(),
        }
    }
}

/// A running engine plus its clipboard monitor.
pub struct App {
    pub settings: SharedSettings,
    pub pipeline: Arc<RequestPipeline>,
    pub engine: EngineHandle,
    engine_task: JoinHandle<()>,
    monitor_task: JoinHandle<()>,
}

impl App {
    /// Spawn the engine and the clipboard monitor. Needs a tokio runtime.
    pub fn start(parts: AppParts) -> Self {
        let pipeline = Arc::new(RequestPipeline::new(
            parts.settings.clone(),
            parts.transport,
            parts.network,
            parts.credentials,
        ));

        let baseline = parts.clipboard.get_text().unwrap_or_default();
        let tracker = Arc::new(Mutex::new(ChangeTracker::seeded(&baseline)));

        let (engine, engine_task) = Engine::spawn(EngineParts {
            pipeline: pipeline.clone(),
            clipboard: parts.clipboard.clone(),
            notifier: parts.notifier,
            tracker: tracker.clone(),
            success_window: SUCCESS_WINDOW,
        });

        let monitor_handle = engine.clone();
        let monitor_task = ClipboardMonitor::new(parts.clipboard, tracker)
            .spawn(move |text| monitor_handle.try_clipboard_captured(text));

        Self {
            settings: parts.settings,
            pipeline,
            engine,
            engine_task,
            monitor_task,
        }
    }

    pub async fn shutdown(self) {
        self.monitor_task.abort();
        if self.engine.shutdown().await.is_ok() {
            let _ = self.engine_task.await;
        }
    }
}
