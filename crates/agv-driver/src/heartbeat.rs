//! Link watchdog
//!
//! Tracks the time since the last sensor sample arrived. Sensor reports are
//! the only traffic the vehicle sends unprompted, so a long silence means the
//! wireless link (or the brick) is gone.
//!
//! Times are stored as microseconds since a process-wide monotonic anchor so
//! they fit in an `AtomicU64` and can be read from any thread.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static APP_START: OnceLock<Instant> = OnceLock::new();

fn monotonic_micros() -> u64 {
    let start = APP_START.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// Link state change reported by [`LinkMonitor::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// No sample for longer than the timeout
    TimedOut(Duration),
    /// Samples resumed after a timeout
    Restored,
}

/// Sensor-link health monitor
pub struct LinkMonitor {
    last_sample: AtomicU64,
    timeout: Duration,
    timed_out: AtomicBool,
}

impl LinkMonitor {
    /// # Example
    /// ```
    /// # use agv_driver::heartbeat::LinkMonitor;
    /// # use std::time::Duration;
    /// let monitor = LinkMonitor::new(Duration::from_secs(10));
    /// assert!(monitor.is_alive());
    /// ```
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_sample: AtomicU64::new(monotonic_micros()),
            timeout,
            timed_out: AtomicBool::new(false),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a sample arrived within the timeout window
    pub fn is_alive(&self) -> bool {
        self.time_since_last_sample() < self.timeout
    }

    /// Record an incoming sample
    ///
    /// Returns `Some(LinkEvent::Restored)` if the link had timed out before.
    pub fn register_sample(&self) -> Option<LinkEvent> {
        self.last_sample.store(monotonic_micros(), Ordering::Relaxed);
        if self.timed_out.swap(false, Ordering::Relaxed) {
            Some(LinkEvent::Restored)
        } else {
            None
        }
    }

    /// Check for a timeout; reports each timeout once until samples resume
    pub fn poll(&self) -> Option<LinkEvent> {
        let silence = self.time_since_last_sample();
        if silence >= self.timeout && !self.timed_out.swap(true, Ordering::Relaxed) {
            Some(LinkEvent::TimedOut(silence))
        } else {
            None
        }
    }

    pub fn time_since_last_sample(&self) -> Duration {
        let last_us = self.last_sample.load(Ordering::Relaxed);
        Duration::from_micros(monotonic_micros().saturating_sub(last_us))
    }
}
