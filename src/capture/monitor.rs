//! Background clipboard watcher.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::debounce::{ChangeTracker, Debouncer, Observation, DEBOUNCE_DELAY};
use crate::platform::Clipboard;

pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ClipboardMonitor {
    clipboard: Arc<dyn Clipboard>,
    tracker: Arc<Mutex<ChangeTracker>>,
    poll_interval: Duration,
    debounce: Duration,
}

impl ClipboardMonitor {
    pub fn new(clipboard: Arc<dyn Clipboard>, tracker: Arc<Mutex<ChangeTracker>>) -> Self {
        Self {
            clipboard,
            tracker,
            poll_interval: POLL_INTERVAL,
            debounce: DEBOUNCE_DELAY,
        }
    }

    pub fn with_timing(mut self, poll_interval: Duration, debounce: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.debounce = debounce;
        self
    }

    /// Poll until `on_capture` returns false. Each committed, debounced
    /// value is passed to `on_capture` exactly once.
    pub fn spawn<F>(self, mut on_capture: F) -> JoinHandle<()>
    where
        F: FnMut(String) -> bool + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut debouncer = Debouncer::new(self.debounce);
            log::info!(
                "[CAPTURE] Clipboard monitor started (poll {}ms, debounce {}ms)",
                self.poll_interval.as_millis(),
                self.debounce.as_millis()
            );

            loop {
                ticker.tick().await;
                let now = Instant::now();

                // Read and observe under one lock so a write-back in
                // progress cannot slip between them.
                let read = {
                    let mut tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
                    self.clipboard.get_text().map(|text| {
                        let observation = if text.trim().is_empty() {
                            Observation::Unchanged
                        } else {
                            tracker.observe(&text)
                        };
                        (text, observation)
                    })
                };
                match read {
                    Ok((text, Observation::External(count))) => {
                        log::debug!("[CAPTURE] Clipboard change #{} ({} chars)", count, text.len());
                        debouncer.signal(text, now);
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("[CAPTURE] Clipboard read failed: {}", e),
                }

                if let Some(text) = debouncer.poll(now) {
                    log::info!("[CAPTURE] Committed clipboard capture ({} chars)", text.len());
                    if !on_capture(text) {
                        break;
                    }
                }
            }
            log::info!("[CAPTURE] Clipboard monitor stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryClipboard;

    #[tokio::test(start_paused = true)]
    async fn rapid_copies_commit_latest_only() {
        let clipboard = Arc::new(MemoryClipboard::with_text("existing"));
        let tracker = Arc::new(Mutex::new(ChangeTracker::seeded("existing")));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = ClipboardMonitor::new(clipboard.clone(), tracker)
            .spawn(move |text| tx.send(text).is_ok());

        tokio::time::sleep(Duration::from_millis(300)).await;
        clipboard.external_copy("step one");
        tokio::time::sleep(Duration::from_millis(250)).await;
        clipboard.external_copy("step two");
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(rx.recv().await.as_deref(), Some("step two"));
        assert!(rx.try_recv().is_err());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn own_writes_are_not_captured() {
        let clipboard = Arc::new(MemoryClipboard::default());
        let tracker = Arc::new(Mutex::new(ChangeTracker::new()));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = ClipboardMonitor::new(clipboard.clone(), tracker.clone())
            .spawn(move |text| tx.send(text).is_ok());

        tracker
            .lock()
            .unwrap()
            .write_own("enhanced", || clipboard.set_text("enhanced"))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(rx.try_recv().is_err());
        handle.abort();
    }
}
