use std::time::Duration;
use tokio::time::Instant;

/// Last executed navigation check, used to suppress repeats for the same path.
#[derive(Clone, Debug, Default)]
pub struct CheckState {
    last_path: Option<String>,
    last_checked_at: Option<Instant>,
}

impl CheckState {
    /// True when a navigation check for `path` at `now` falls inside `window`
    /// of the previous check for that same path.
    #[must_use]
    pub fn is_debounced(&self, path: &str, now: Instant, window: Duration) -> bool {
        match (&self.last_path, self.last_checked_at) {
            (Some(last), Some(at)) if last == path => now.saturating_duration_since(at) < window,
            _ => false,
        }
    }

    pub fn record(&mut self, path: &str, now: Instant) {
        self.last_path = Some(path.to_string());
        self.last_checked_at = Some(now);
    }

    #[must_use]
    pub fn last_path(&self) -> Option<&str> {
        self.last_path.as_deref()
    }
}
