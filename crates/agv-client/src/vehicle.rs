//! Vehicle handle
//!
//! Runs an [`Orchestrator`] on a dedicated control thread. The handle only
//! enqueues [`ControlEvent`]s, so sensor callbacks and operator controls
//! never block on motor I/O, and ticks can never overlap.
//!
//! `stop()` cancels the shared token before enqueueing the stop event: a hold
//! in progress returns immediately and samples still queued behind it are
//! dropped instead of driving the motors again.

use crate::config::SpeedSource;
use crate::error::{Result, VehicleError};
use crate::observer::PresentationObserver;
use crate::orchestrator::Orchestrator;
use crate::state::VehicleSnapshot;
use agv_driver::{CancelToken, DriverError, MotorActuator};
use agv_protocol::SensorSample;
use agv_tools::VehicleTuning;
use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded, unbounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

/// Errors kept for [`Vehicle::take_errors`]; older ones are dropped
const ERROR_QUEUE_CAPACITY: usize = 64;

/// Event consumed by the control thread
#[derive(Debug, Clone)]
pub enum ControlEvent {
    Start,
    Stop,
    Sample(SensorSample, Instant),
    Disconnect,
    /// Acknowledged once every earlier event was handled
    Flush(Sender<()>),
    Shutdown,
}

/// Publishes snapshots into a lock-free cell
struct SnapshotCell(Arc<ArcSwap<VehicleSnapshot>>);

impl PresentationObserver for SnapshotCell {
    fn on_snapshot(&self, snapshot: &VehicleSnapshot) {
        self.0.store(Arc::new(snapshot.clone()));
    }
}

/// Handle to a vehicle control thread
///
/// Dropping the handle brakes the motors (if a run is active) and joins the
/// thread.
pub struct Vehicle {
    event_tx: Option<Sender<ControlEvent>>,
    cancel: CancelToken,
    snapshot: Arc<ArcSwap<VehicleSnapshot>>,
    errors: Receiver<VehicleError>,
    thread: Option<JoinHandle<()>>,
}

impl Vehicle {
    /// Spawn a control thread with default observers and hooks
    pub fn spawn<A>(
        actuator: A,
        speeds: Arc<dyn SpeedSource>,
        tuning: &VehicleTuning,
    ) -> Result<Self>
    where
        A: MotorActuator + 'static,
    {
        let orchestrator = Orchestrator::new(actuator, speeds, tuning);
        Self::from_orchestrator(orchestrator, tuning.link.sample_timeout())
    }

    /// Spawn a control thread around a configured orchestrator
    ///
    /// `sample_timeout` is the longest the loop waits for an event before
    /// treating the silence as a sensor gap.
    pub fn from_orchestrator<A>(
        mut orchestrator: Orchestrator<A>,
        sample_timeout: Duration,
    ) -> Result<Self>
    where
        A: MotorActuator + 'static,
    {
        let snapshot = Arc::new(ArcSwap::from_pointee(orchestrator.snapshot()));
        orchestrator.add_observer(Arc::new(SnapshotCell(snapshot.clone())));

        let cancel = orchestrator.cancel_token().clone();
        let (event_tx, event_rx) = unbounded();
        let (error_tx, errors) = bounded(ERROR_QUEUE_CAPACITY);

        let thread = thread::Builder::new()
            .name("agv-control".to_string())
            .spawn(move || control_loop(orchestrator, event_rx, error_tx, sample_timeout))
            .map_err(VehicleError::Spawn)?;

        info!("Vehicle control thread started");
        Ok(Self {
            event_tx: Some(event_tx),
            cancel,
            snapshot,
            errors,
            thread: Some(thread),
        })
    }

    pub fn start(&self) -> Result<()> {
        self.send(ControlEvent::Start)
    }

    /// Interrupt whatever is running, brake and reset
    pub fn stop(&self) -> Result<()> {
        self.cancel.cancel();
        self.send(ControlEvent::Stop)
    }

    pub fn disconnect(&self) -> Result<()> {
        self.send(ControlEvent::Disconnect)
    }

    pub fn push_sample(&self, sample: SensorSample) -> Result<()> {
        self.push_sample_at(sample, Instant::now())
    }

    /// Deliver a sample with an explicit timestamp
    pub fn push_sample_at(&self, sample: SensorSample, now: Instant) -> Result<()> {
        self.send(ControlEvent::Sample(sample, now))
    }

    /// Block until every event enqueued so far was handled
    ///
    /// Returns `false` if that took longer than `timeout`; the events keep
    /// being processed regardless.
    pub fn flush(&self, timeout: Duration) -> Result<bool> {
        let (done_tx, done_rx) = bounded(1);
        self.send(ControlEvent::Flush(done_tx))?;
        Ok(done_rx.recv_timeout(timeout).is_ok())
    }

    /// Latest published snapshot (lock-free)
    pub fn snapshot(&self) -> VehicleSnapshot {
        self.snapshot.load().as_ref().clone()
    }

    /// Errors returned by the orchestrator since the last call
    pub fn take_errors(&self) -> Vec<VehicleError> {
        self.errors.try_iter().collect()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the control thread and wait for it
    pub fn shutdown(mut self) -> Result<()> {
        self.close()
    }

    fn send(&self, event: ControlEvent) -> Result<()> {
        trace!(?event, "enqueue control event");
        self.event_tx
            .as_ref()
            .ok_or(DriverError::ChannelClosed)?
            .send(event)
            .map_err(|_| DriverError::ChannelClosed.into())
    }

    fn close(&mut self) -> Result<()> {
        let Some(event_tx) = self.event_tx.take() else {
            return Ok(());
        };
        // Wake any hold so the shutdown is not delayed by it
        self.cancel.cancel();
        let _ = event_tx.send(ControlEvent::Shutdown);
        drop(event_tx);

        match self.thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| DriverError::ControlThread("control thread panicked".into()).into()),
            None => Ok(()),
        }
    }
}

impl Drop for Vehicle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!("Vehicle shutdown failed: {}", e);
        }
    }
}

fn control_loop<A: MotorActuator>(
    mut orchestrator: Orchestrator<A>,
    events: Receiver<ControlEvent>,
    errors: Sender<VehicleError>,
    sample_timeout: Duration,
) {
    let report = |result: Result<()>| {
        if let Err(e) = result {
            if e.is_cancelled() {
                debug!("batch interrupted by stop request");
                return;
            }
            error!("Control event failed: {}", e);
            if let Err(TrySendError::Full(_)) = errors.try_send(e) {
                debug!("error queue full, error dropped");
            }
        }
    };

    loop {
        match events.recv_timeout(sample_timeout) {
            Ok(ControlEvent::Start) => report(orchestrator.start()),
            Ok(ControlEvent::Stop) => report(orchestrator.stop()),
            Ok(ControlEvent::Sample(sample, now)) => {
                report(orchestrator.handle_sample(sample, now))
            },
            Ok(ControlEvent::Disconnect) => orchestrator.disconnect(),
            Ok(ControlEvent::Flush(done)) => {
                let _ = done.send(());
            },
            Ok(ControlEvent::Shutdown) => {
                if orchestrator.machine().is_started() {
                    report(orchestrator.stop());
                }
                break;
            },
            Err(RecvTimeoutError::Timeout) => orchestrator.handle_gap(),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    info!("Vehicle control thread exited");
}
