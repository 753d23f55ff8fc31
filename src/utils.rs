use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Trailing-edge debounce: only the latest value survives a burst.
///
/// Every `push` replaces the pending value and restarts the quiet period.
/// The value becomes available once the quiet period has elapsed with no
/// further pushes.
pub struct Debouncer<T> {
    pending: Option<(T, Instant)>,
    debounce_duration: Duration,
}

impl<T> Debouncer<T> {
    pub fn with_duration(debounce_duration: Duration) -> Self {
        Self {
            pending: None,
            debounce_duration,
        }
    }

    /// Queue a value, cancelling whatever was pending
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.debounce_duration));
    }

    /// When the pending value becomes ready, if there is one
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Take the pending value if its quiet period is over
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }
}

/// Milliseconds since the Unix epoch, used to stamp captured snapshots
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
