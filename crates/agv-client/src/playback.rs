//! Trace playback
//!
//! Feeds a recorded [`SampleTrace`] into a [`Vehicle`]. Samples are stamped
//! on a virtual timeline (trace start plus the accumulated delays), so the
//! maneuver timing is the same whether or not playback is paced in real time.

use crate::error::Result;
use crate::vehicle::Vehicle;
use agv_tools::SampleTrace;
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct PlaybackOptions {
    /// Sleep for each sample's delay before delivering it
    pub paced: bool,
    /// Override the trace's `auto_start`
    pub auto_start: Option<bool>,
    /// Set from another thread (e.g. Ctrl+C) to end playback early
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl PlaybackOptions {
    pub fn paced() -> Self {
        Self {
            paced: true,
            ..Self::default()
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackReport {
    pub samples_sent: usize,
    /// Span of the virtual timeline covered
    pub trace_time: Duration,
    pub interrupted: bool,
}

/// Deliver every sample of `trace` to `vehicle`
///
/// Returns once the last sample is enqueued; the vehicle may still be
/// processing it.
pub fn play_trace(
    vehicle: &Vehicle,
    trace: &SampleTrace,
    options: &PlaybackOptions,
) -> Result<PlaybackReport> {
    let samples = trace.sensor_samples()?;
    let sleeper = SpinSleeper::default();
    let origin = Instant::now();
    let mut report = PlaybackReport::default();

    info!(
        name = trace.name.as_deref().unwrap_or("<unnamed>"),
        samples = samples.len(),
        paced = options.paced,
        "Replaying trace"
    );

    if options.auto_start.unwrap_or(trace.auto_start) {
        vehicle.start()?;
    }

    for (delay, sample) in samples {
        if options.interrupted() {
            info!("Playback interrupted after {} samples", report.samples_sent);
            report.interrupted = true;
            break;
        }
        if options.paced && !delay.is_zero() {
            sleeper.sleep(delay);
        }
        report.trace_time += delay;

        debug!(color = %sample.line_color, distance_cm = sample.distance_cm, "replay sample");
        vehicle.push_sample_at(sample, origin + report.trace_time)?;
        report.samples_sent += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;
    use crate::config::OperatorSpeeds;
    use agv_driver::MockActuator;
    use agv_protocol::MotorCommand;
    use agv_tools::{TraceSample, VehicleTuning};

    fn pickup_trace() -> SampleTrace {
        SampleTrace {
            name: Some("pickup".into()),
            auto_start: true,
            samples: vec![
                TraceSample::new(4, 50.0, 0),
                TraceSample::new(6, 50.0, 100),
                TraceSample::new(1, 30.0, 100),
                TraceSample::new(1, 4.0, 300),
                TraceSample::new(1, 4.0, 100),
            ],
        }
    }

    fn wait_for(vehicle: &Vehicle, status: Status) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if vehicle.snapshot().status == status {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_unpaced_replay_uses_virtual_time() {
        let (actuator, handle) = MockActuator::new();
        let vehicle = Vehicle::spawn(
            actuator,
            Arc::new(OperatorSpeeds::new("20", "30")),
            &VehicleTuning::default(),
        )
        .unwrap();

        let report = play_trace(&vehicle, &pickup_trace(), &PlaybackOptions::default()).unwrap();
        assert_eq!(report.samples_sent, 5);
        assert_eq!(report.trace_time, Duration::from_millis(600));
        assert!(!report.interrupted);

        assert!(wait_for(&vehicle, Status::MovingToDropoff));
        // Retreat hold equals the 300ms approach on the trace timeline
        assert!(
            handle
                .commands()
                .contains(&MotorCommand::wait(Duration::from_millis(300)))
        );
    }

    #[test]
    fn test_interrupt_stops_playback() {
        let (actuator, _handle) = MockActuator::new();
        let vehicle = Vehicle::spawn(
            actuator,
            Arc::new(OperatorSpeeds::new("20", "30")),
            &VehicleTuning::default(),
        )
        .unwrap();

        let options = PlaybackOptions {
            interrupt: Some(Arc::new(AtomicBool::new(true))),
            ..PlaybackOptions::default()
        };
        let report = play_trace(&vehicle, &pickup_trace(), &options).unwrap();
        assert_eq!(report.samples_sent, 0);
        assert!(report.interrupted);
    }
}
