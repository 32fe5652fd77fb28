//! Single-slot deadline timer.
//!
//! Scheduling replaces whatever was pending, so a burst of calls inside the
//! window collapses into one firing after the last call. The host drives
//! time: nothing here sleeps or spawns.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer for `now + delay`, superseding any pending payload
    pub fn schedule(&mut self, now: Instant, payload: T) {
        self.pending = Some((now + self.delay, payload));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    /// Take the payload if its deadline has passed
    pub fn fire_due(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((due, _)) if now >= due => self.cancel(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(100);

    #[test]
    fn test_fires_only_after_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(start, 1);

        assert_eq!(debouncer.fire_due(start + Duration::from_millis(99)), None);
        assert_eq!(debouncer.fire_due(start + DELAY), Some(1));
        assert_eq!(debouncer.fire_due(start + DELAY * 2), None);
    }

    #[test]
    fn test_later_schedule_supersedes_earlier() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(start, "first");
        debouncer.schedule(start + Duration::from_millis(40), "second");
        debouncer.schedule(start + Duration::from_millis(80), "third");

        // The first deadline has passed but was replaced
        assert_eq!(debouncer.fire_due(start + Duration::from_millis(120)), None);
        assert_eq!(
            debouncer.fire_due(start + Duration::from_millis(180)),
            Some("third")
        );
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_cancel_clears_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(start, ());
        assert_eq!(debouncer.deadline(), Some(start + DELAY));
        assert_eq!(debouncer.cancel(), Some(()));
        assert_eq!(debouncer.deadline(), None);
    }
}
