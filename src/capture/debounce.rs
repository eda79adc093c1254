//! Clipboard change detection and debouncing.

use std::time::Duration;

use tokio::time::Instant;

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(400);

/// Result of looking at the clipboard once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Unchanged,
    /// New text from somewhere else. Carries the new change count.
    External(u64),
}

/// Tracks the last clipboard value seen and a monotonically increasing
/// change count. Shared between the monitor and whoever writes results
/// back, so those writes are not mistaken for user copies.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    change_count: u64,
    last_seen: Option<String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline from the clipboard at startup, so existing text is not
    /// reported as a change.
    pub fn seeded(text: &str) -> Self {
        Self {
            change_count: 0,
            last_seen: Some(text.to_string()),
        }
    }

    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    pub fn observe(&mut self, text: &str) -> Observation {
        if self.last_seen.as_deref() == Some(text) {
            return Observation::Unchanged;
        }
        self.change_count += 1;
        self.last_seen = Some(text.to_string());
        Observation::External(self.change_count)
    }

    /// Put `text` on the clipboard through `write` as our own change. The
    /// next observation of that text reads as unchanged. A failed write
    /// leaves the tracker as it was.
    ///
    /// Callers hold the tracker lock for the whole call, and the monitor
    /// holds it across its read and `observe`, so a poll never sees the
    /// old value after `last_seen` has moved on.
    pub fn write_own<E>(
        &mut self,
        text: &str,
        write: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), E> {
        let previous = self.last_seen.replace(text.to_string());
        match write() {
            Ok(()) => {
                self.change_count += 1;
                Ok(())
            }
            Err(e) => {
                self.last_seen = previous;
                Err(e)
            }
        }
    }
}

/// Coalesces rapid change signals into one committed value.
///
/// Every signal restarts the delay. A value is committed once the delay
/// passes with no further signal, and only if it differs from the last
/// committed value.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
    last_committed: Option<String>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            last_committed: None,
        }
    }

    pub fn signal(&mut self, text: String, now: Instant) {
        self.pending = Some((text, now + self.delay));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// The committed value, once the delay has passed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, at)) if *at <= now => {}
            _ => return None,
        }
        let (text, _) = self.pending.take()?;
        if self.last_committed.as_deref() == Some(text.as_str()) {
            log::debug!("[CAPTURE] Ignoring duplicate clipboard value");
            return None;
        }
        self.last_committed = Some(text.clone());
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_counts_external_changes_only_once() {
        let mut t = ChangeTracker::seeded("boot");
        assert_eq!(t.observe("boot"), Observation::Unchanged);
        assert_eq!(t.observe("a"), Observation::External(1));
        assert_eq!(t.observe("a"), Observation::Unchanged);
        assert_eq!(t.observe("b"), Observation::External(2));
    }

    #[test]
    fn own_write_is_not_reported() {
        let mut t = ChangeTracker::new();
        t.observe("input");
        t.write_own("enhanced", || Ok::<(), String>(())).unwrap();
        assert_eq!(t.observe("enhanced"), Observation::Unchanged);
        assert_eq!(t.change_count(), 2);
        assert_eq!(t.observe("next copy"), Observation::External(3));
    }

    #[test]
    fn failed_own_write_keeps_previous_baseline() {
        let mut t = ChangeTracker::seeded("user text");
        let err = t
            .write_own("enhanced", || Err("clipboard busy".to_string()))
            .unwrap_err();
        assert_eq!(err, "clipboard busy");
        assert_eq!(t.change_count(), 0);
        // The clipboard still holds the user's text; that is not a change.
        assert_eq!(t.observe("user text"), Observation::Unchanged);
        assert_eq!(t.observe("enhanced"), Observation::External(1));
    }

    #[tokio::test(start_paused = true)]
    async fn identical_signals_inside_window_commit_once() {
        let mut d = Debouncer::default();
        let t0 = Instant::now();
        d.signal("same".into(), t0);
        d.signal("same".into(), t0 + Duration::from_millis(100));
        assert_eq!(d.poll(t0 + Duration::from_millis(300)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(500)), Some("same".into()));
        assert_eq!(d.poll(t0 + Duration::from_millis(900)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn latest_signal_wins() {
        let mut d = Debouncer::new(Duration::from_millis(400));
        let t0 = Instant::now();
        d.signal("partial".into(), t0);
        d.signal("final".into(), t0 + Duration::from_millis(200));
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(600)));
        assert_eq!(d.poll(t0 + Duration::from_millis(500)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(600)), Some("final".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn recommitting_the_same_value_is_ignored() {
        let mut d = Debouncer::new(Duration::from_millis(10));
        let t0 = Instant::now();
        d.signal("x".into(), t0);
        assert_eq!(d.poll(t0 + Duration::from_millis(10)), Some("x".into()));
        d.signal("x".into(), t0 + Duration::from_secs(5));
        assert_eq!(d.poll(t0 + Duration::from_secs(6)), None);
        d.signal("y".into(), t0 + Duration::from_secs(7));
        assert_eq!(d.poll(t0 + Duration::from_secs(8)), Some("y".into()));
    }
}
