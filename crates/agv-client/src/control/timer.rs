//! Stopwatch over caller-supplied instants
//!
//! The control core never reads the clock itself; every tick carries its own
//! `now`, so timing is reproducible in tests and trace replays.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElapsedTimer {
    started_at: Option<Instant>,
    elapsed: Duration,
}

impl ElapsedTimer {
    pub const fn new() -> Self {
        Self {
            started_at: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Start measuring; no-op while running
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Stop measuring and accumulate the running interval
    pub fn stop(&mut self, now: Instant) {
        if let Some(started_at) = self.started_at.take() {
            self.elapsed += now.saturating_duration_since(started_at);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Accumulated time of all stopped intervals
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop() {
        let t0 = Instant::now();
        let mut timer = ElapsedTimer::new();
        assert!(!timer.is_running());

        timer.start(t0);
        assert!(timer.is_running());
        // Second start keeps the original origin
        timer.start(t0 + Duration::from_millis(100));
        timer.stop(t0 + Duration::from_millis(750));

        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(), Duration::from_millis(750));
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut timer = ElapsedTimer::new();
        timer.stop(Instant::now());
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_clock_going_backwards_saturates() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut timer = ElapsedTimer::new();
        timer.start(t0);
        timer.stop(t0 - Duration::from_millis(10));
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_reset() {
        let t0 = Instant::now();
        let mut timer = ElapsedTimer::new();
        timer.start(t0);
        timer.stop(t0 + Duration::from_millis(10));
        timer.start(t0 + Duration::from_millis(20));

        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }
}
