//! Actuator seam and cooperative cancellation
//!
//! The transport (Bluetooth serial link, simulator, mock) implements
//! [`MotorActuator`]. Every call returns only once the command has been
//! acknowledged, so the executor can rely on strict ordering.
//!
//! Waits are real suspension points: [`CancelToken::wait`] blocks on a wake
//! channel with a timeout, so a stop request interrupts a hold immediately
//! instead of after it expires.

use crate::DriverError;
use agv_protocol::ChannelSet;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Motor output interface
///
/// Implementations must block until the command is acknowledged (or failed).
pub trait MotorActuator: Send {
    /// Run the channels at a signed speed
    fn set_speed(&mut self, channels: ChannelSet, speed: i32) -> Result<(), DriverError>;

    /// Stop the channels, braking (`brake = true`) or coasting
    fn stop(&mut self, channels: ChannelSet, brake: bool) -> Result<(), DriverError>;

    /// Hold for `duration`, returning early with `Cancelled` on a stop request
    fn wait(&mut self, duration: Duration, cancel: &CancelToken) -> Result<(), DriverError> {
        cancel.wait(duration)
    }
}

impl<A: MotorActuator + ?Sized> MotorActuator for Box<A> {
    fn set_speed(&mut self, channels: ChannelSet, speed: i32) -> Result<(), DriverError> {
        (**self).set_speed(channels, speed)
    }

    fn stop(&mut self, channels: ChannelSet, brake: bool) -> Result<(), DriverError> {
        (**self).stop(channels, brake)
    }

    fn wait(&mut self, duration: Duration, cancel: &CancelToken) -> Result<(), DriverError> {
        (**self).wait(duration, cancel)
    }
}

struct CancelInner {
    /// Stop requests not yet acknowledged by the control thread
    pending: AtomicUsize,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

/// Stop request shared between the control thread and its handle
///
/// Requests are counted: every [`cancel`](Self::cancel) stays in effect
/// until a matching [`acknowledge`](Self::acknowledge), so a request made
/// while an earlier one is being handled is never cleared by it. Cloning is
/// cheap; all clones observe the same count.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        // Capacity 1: one pending wake-up is enough to interrupt the single waiter
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            inner: Arc::new(CancelInner {
                pending: AtomicUsize::new(0),
                wake_tx,
                wake_rx,
            }),
        }
    }

    /// Request cancellation and wake any in-progress wait
    pub fn cancel(&self) {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        let _ = self.inner.wake_tx.try_send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.pending() > 0
    }

    /// Stop requests still outstanding
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Mark one stop request as handled
    ///
    /// Saturates at zero, so acknowledging without a request is harmless.
    pub fn acknowledge(&self) {
        let previous = self
            .inner
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous == Ok(1) {
            self.drain_wakeups();
        }
    }

    /// Drop every outstanding request
    pub fn reset(&self) {
        self.inner.pending.store(0, Ordering::Release);
        self.drain_wakeups();
    }

    fn drain_wakeups(&self) {
        while self.inner.wake_rx.try_recv().is_ok() {}
    }

    /// Fail fast if cancellation was requested
    pub fn check(&self) -> Result<(), DriverError> {
        if self.is_cancelled() {
            Err(DriverError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Block for `duration` unless cancelled first
    pub fn wait(&self, duration: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + duration;
        loop {
            self.check()?;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }

            match self.inner.wake_rx.recv_timeout(remaining) {
                // Stale wake-ups (cancel raced with reset) fall through to the flag check
                Ok(()) | Err(RecvTimeoutError::Timeout) => {},
                Err(RecvTimeoutError::Disconnected) => {
                    // We own the sender, so this cannot happen; degrade to a plain sleep
                    std::thread::sleep(remaining);
                },
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("pending", &self.pending())
            .finish()
    }
}
