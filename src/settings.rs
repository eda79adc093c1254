//! Persisted user settings.
//!
//! The whole record lives in one JSON file at
//! `~/.config/textlift/settings.json` (macOS:
//! `~/Library/Application Support/textlift/settings.json`).
//!
//! `SharedSettings` is the single writer: every setter mutates the record
//! and writes it back under one mutex, so a crash never loses more than the
//! change in flight. Persistence failures are logged and otherwise ignored;
//! the in-memory record stays authoritative.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::llm::Provider;
use crate::prompt_store::{Prompt, PromptError, PromptStore};

const APP_DIR: &str = "textlift";
const SETTINGS_FILE: &str = "settings.json";

/// Overrides the persisted provider for this session.
pub const PROVIDER_ENV: &str = "TEXTLIFT_PROVIDER";

// ── Record ───────────────────────────────────────────────────────────

/// What auto-mode does with a newly captured clipboard value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutoModeBehavior {
    /// Tell the user text is ready; wait for the process hotkey.
    #[default]
    NotifyOnly,
    /// Start processing as soon as the capture is committed.
    ProcessImmediately,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl Modifier {
    fn label(self) -> &'static str {
        match self {
            Modifier::Ctrl => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::Super => "Win",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotkey {
    pub key: String,
    pub modifiers: Vec<Modifier>,
}

impl Hotkey {
    pub fn new(key: &str, modifiers: &[Modifier]) -> Self {
        Self {
            key: key.to_string(),
            modifiers: modifiers.to_vec(),
        }
    }
}

/// Shortcut text such as `Ctrl+Alt+E`. Modifiers print in a fixed order.
impl std::fmt::Display for Hotkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for m in [Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Super] {
            if self.modifiers.contains(&m) {
                write!(f, "{}+", m.label())?;
            }
        }
        f.write_str(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyBindings {
    pub process_text: Hotkey,
    pub toggle_auto_mode: Hotkey,
}

impl Default for HotkeyBindings {
    fn default() -> Self {
        Self {
            process_text: Hotkey::new("E", &[Modifier::Ctrl, Modifier::Alt]),
            toggle_auto_mode: Hotkey::new("A", &[Modifier::Ctrl, Modifier::Alt]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPrefs {
    pub show_notifications: bool,
    pub play_sounds: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            show_notifications: true,
            play_sounds: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: String,
    pub provider: Provider,
    /// Empty means "use the provider's default model".
    pub custom_model: String,
    pub prompts: PromptStore,
    pub auto_mode: bool,
    pub auto_mode_behavior: AutoModeBehavior,
    pub notifications: NotificationPrefs,
    pub hotkeys: HotkeyBindings,
    pub start_at_login: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            provider: Provider::OpenAi,
            custom_model: String::new(),
            prompts: PromptStore::default(),
            auto_mode: false,
            auto_mode_behavior: AutoModeBehavior::NotifyOnly,
            notifications: NotificationPrefs::default(),
            hotkeys: HotkeyBindings::default(),
            start_at_login: true,
        }
    }
}

impl Settings {
    pub fn model_override(&self) -> Option<&str> {
        let model = self.custom_model.trim();
        (!model.is_empty()).then_some(model)
    }

    pub fn selected_prompt(&self) -> &Prompt {
        self.prompts.selected()
    }
}

// ── Persistence ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Settings file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Load/save collaborator for the settings record.
pub trait SettingsStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Settings>, SettingsError>;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Pretty-printed JSON file on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The platform config directory, or the working directory if none.
    pub fn default_location() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::new(dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        log::debug!("[SETTINGS] Saved {}", self.path.display());
        Ok(())
    }
}

/// Keeps the record in memory. Counts saves so callers can observe writes.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Option<Settings>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn with(settings: Settings) -> Self {
        Self {
            saved: Mutex::new(Some(settings)),
            saves: Mutex::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        *lock(&self.saves)
    }

    pub fn last_saved(&self) -> Option<Settings> {
        lock(&self.saved).clone()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<Settings>, SettingsError> {
        Ok(lock(&self.saved).clone())
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        *lock(&self.saved) = Some(settings.clone());
        *lock(&self.saves) += 1;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ── Shared handle ────────────────────────────────────────────────────

/// Cloneable handle to the live settings record.
#[derive(Clone)]
pub struct SharedSettings {
    inner: Arc<Mutex<Settings>>,
    store: Arc<dyn SettingsStore>,
    /// Provider from disk while a session override is active. Saves write
    /// this one instead of the override.
    persisted_provider: Arc<Mutex<Option<Provider>>>,
}

impl SharedSettings {
    /// Load from `store`, synthesising defaults when absent or corrupt.
    pub fn load(store: Arc<dyn SettingsStore>) -> Self {
        let settings = match store.load() {
            Ok(Some(settings)) => {
                log::info!("[SETTINGS] Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("[SETTINGS] No settings found, writing defaults");
                let defaults = Settings::default();
                if let Err(e) = store.save(&defaults) {
                    log::error!("[SETTINGS] Failed to write defaults: {}", e);
                }
                defaults
            }
            Err(e) => {
                log::warn!("[SETTINGS] {}; using defaults", e);
                Settings::default()
            }
        };
        Self {
            inner: Arc::new(Mutex::new(settings)),
            store,
            persisted_provider: Arc::new(Mutex::new(None)),
        }
    }

    /// Load, then apply the session-only provider override from the environment.
    pub fn load_with_env(store: Arc<dyn SettingsStore>) -> Self {
        let shared = Self::load(store);
        if let Ok(raw) = std::env::var(PROVIDER_ENV) {
            match Provider::from_name(&raw) {
                Some(p) => shared.override_provider(p),
                None => log::warn!("[SETTINGS] Ignoring unknown {}={}", PROVIDER_ENV, raw),
            }
        }
        shared
    }

    /// In-memory settings, for tests and headless use.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(settings)),
            store: Arc::new(MemoryStore::default()),
            persisted_provider: Arc::new(Mutex::new(None)),
        }
    }

    /// Use `provider` for this session without writing it to the store.
    /// Later saves keep the provider that was on disk; `set_provider` ends
    /// the override.
    pub fn override_provider(&self, provider: Provider) {
        let mut guard = lock(&self.inner);
        lock(&self.persisted_provider).get_or_insert(guard.provider);
        guard.provider = provider;
        log::info!("[SETTINGS] Provider override for this session: {}", provider);
    }

    pub fn snapshot(&self) -> Settings {
        lock(&self.inner).clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        f(&lock(&self.inner))
    }

    /// Mutate and persist in one critical section.
    pub fn update<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> R {
        let mut guard = lock(&self.inner);
        let out = f(&mut guard);
        self.persist(&guard);
        out
    }

    /// Like `update`, but only persists when `f` succeeds.
    pub fn try_update<R, E>(&self, f: impl FnOnce(&mut Settings) -> Result<R, E>) -> Result<R, E> {
        let mut guard = lock(&self.inner);
        let out = f(&mut guard)?;
        self.persist(&guard);
        Ok(out)
    }

    fn persist(&self, settings: &Settings) {
        let saved = match *lock(&self.persisted_provider) {
            Some(provider) => self.store.save(&Settings {
                provider,
                ..settings.clone()
            }),
            None => self.store.save(settings),
        };
        if let Err(e) = saved {
            log::error!("[SETTINGS] Failed to persist settings: {}", e);
        }
    }

    pub fn set_api_key(&self, api_key: &str) {
        self.update(|s| s.api_key = api_key.trim().to_string());
        log::info!("[SETTINGS] API key updated ({} chars)", api_key.trim().len());
    }

    pub fn set_provider(&self, provider: Provider) {
        self.update(|s| {
            lock(&self.persisted_provider).take();
            s.provider = provider;
        });
        log::info!("[SETTINGS] Active provider set to: {}", provider);
    }

    pub fn set_custom_model(&self, model: &str) {
        self.update(|s| s.custom_model = model.trim().to_string());
    }

    pub fn set_auto_mode(&self, enabled: bool) {
        self.update(|s| s.auto_mode = enabled);
    }

    /// Flip auto-mode and return the new value.
    pub fn toggle_auto_mode(&self) -> bool {
        self.update(|s| {
            s.auto_mode = !s.auto_mode;
            s.auto_mode
        })
    }

    pub fn set_auto_mode_behavior(&self, behavior: AutoModeBehavior) {
        self.update(|s| s.auto_mode_behavior = behavior);
    }

    pub fn set_notifications(&self, prefs: NotificationPrefs) {
        self.update(|s| s.notifications = prefs);
    }

    pub fn set_hotkeys(&self, hotkeys: HotkeyBindings) {
        self.update(|s| s.hotkeys = hotkeys);
    }

    pub fn set_start_at_login(&self, enabled: bool) {
        self.update(|s| s.start_at_login = enabled);
    }

    pub fn create_prompt(&self, name: &str, text: &str) -> Result<Uuid, PromptError> {
        self.try_update(|s| s.prompts.create(name, text))
    }

    pub fn edit_prompt(&self, id: Uuid, name: &str, text: &str) -> Result<(), PromptError> {
        self.try_update(|s| s.prompts.edit(id, name, text))
    }

    pub fn delete_prompt(&self, id: Uuid) -> Result<Prompt, PromptError> {
        self.try_update(|s| s.prompts.delete(id))
    }

    pub fn select_prompt(&self, id: Uuid) -> Result<(), PromptError> {
        self.try_update(|s| s.prompts.select(id))
    }
}
