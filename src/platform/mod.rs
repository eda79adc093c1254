//! Platform collaborators: clipboard, notifications, network reachability.
//!
//! The engine only sees these traits. Native front-ends (tray apps, toast
//! notifications) provide their own implementations; the ones here cover a
//! headless run and tests.

use std::net::UdpSocket;
use std::sync::Mutex;

pub trait Clipboard: Send + Sync {
    /// Current clipboard text. An empty or non-text clipboard reads as `""`.
    fn get_text(&self) -> Result<String, String>;
    fn set_text(&self, text: &str) -> Result<(), String>;
}

/// Native clipboard through arboard.
///
/// A fresh handle per call: some backends tie the handle to the thread
/// that opened it, and calls here are rare.
#[derive(Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn get_text(&self) -> Result<String, String> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        match clipboard.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(e.to_string()),
        }
    }

    fn set_text(&self, text: &str) -> Result<(), String> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        clipboard.set_text(text).map_err(|e| e.to_string())?;
        log::info!("[CLIPBOARD] Copied {} chars to clipboard", text.len());
        Ok(())
    }
}

/// Process-local clipboard. Writes are recorded in order.
#[derive(Default)]
pub struct MemoryClipboard {
    text: Mutex<String>,
    writes: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Mutex::new(text.to_string()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Simulate another application copying text.
    pub fn external_copy(&self, text: &str) {
        *self.text.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&self) -> Result<String, String> {
        Ok(self.text.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set_text(&self, text: &str) -> Result<(), String> {
        *self.text.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());
        Ok(())
    }
}

// ── Notifications ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub sound: bool,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
            sound: false,
        }
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log. Stands in for OS toasts.
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        match n.kind {
            NotificationKind::Error => log::warn!("[NOTIFY] {}: {}", n.title, n.body),
            _ => log::info!("[NOTIFY] {}: {}", n.title, n.body),
        }
    }
}

// ── Network reachability ─────────────────────────────────────────────

pub trait NetworkProbe: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Asks the OS for a route to a public address. A UDP connect sends no
/// packets; it only fails when no interface can reach the address.
pub struct InterfaceProbe {
    target: String,
}

impl Default for InterfaceProbe {
    fn default() -> Self {
        Self {
            target: "1.1.1.1:53".to_string(),
        }
    }
}

impl InterfaceProbe {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl NetworkProbe for InterfaceProbe {
    fn is_reachable(&self) -> bool {
        let socket = match UdpSocket::bind("0.0.0.0:0") {
            Ok(s) => s,
            Err(e) => {
                log::debug!("[NETWORK] Could not bind probe socket: {}", e);
                return false;
            }
        };
        match socket.connect(&self.target) {
            Ok(()) => true,
            Err(e) => {
                log::info!("[NETWORK] No route to {}: {}", self.target, e);
                false
            }
        }
    }
}

/// Fixed answer. For tests and for hosts where probing is unwanted.
pub struct StaticProbe(pub bool);

impl NetworkProbe for StaticProbe {
    fn is_reachable(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clipboard_records_writes() {
        let clip = MemoryClipboard::with_text("start");
        clip.set_text("one").unwrap();
        clip.external_copy("from another app");
        assert_eq!(clip.get_text().unwrap(), "from another app");
        assert_eq!(clip.writes(), vec!["one".to_string()]);
    }

    #[test]
    fn loopback_probe_is_reachable() {
        assert!(InterfaceProbe::new("127.0.0.1:9").is_reachable());
    }
}
