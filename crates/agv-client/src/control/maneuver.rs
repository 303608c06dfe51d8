//! Pickup maneuver
//!
//! On entering `Grabbing` the vehicle keeps following the line toward the
//! object while a timer runs. Once the ultrasonic distance drops below the
//! grab threshold, one fixed sequence is emitted:
//!
//! ```text
//! stop BD (brake)
//! speed C  <gripper>   wait 0.5s   stop C (brake)        close gripper
//! speed BD -<drive>    wait <t>    stop BD (brake)       retreat for the approach time
//! speed B  <rotate>    wait 4s     stop B (brake)        turn toward the next path
//! speed BD <drive>                                       resume
//! ```
//!
//! `<t>` is the time spent approaching, so the vehicle backs out to where
//! it entered the pickup area. The sequence fires at most once until the
//! state is reset.

use super::Speeds;
use crate::state::{Polarity, Status, VehicleState};
use agv_driver::CommandBatch;
use agv_protocol::{ChannelSet, MotorChannel, MotorCommand, SensorSample};
use agv_tools::ManeuverTuning;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone)]
pub struct PickupManeuver {
    tuning: ManeuverTuning,
}

impl PickupManeuver {
    pub fn new(tuning: ManeuverTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &ManeuverTuning {
        &self.tuning
    }

    /// Advance the maneuver by one `Grabbing` tick
    ///
    /// Returns the sequence when the grab trigger fires on this tick. Marks
    /// the state as triggered; the status change to `FindingPath` is left to
    /// the caller so it can wait for the sequence to be executed.
    pub fn poll(
        &self,
        state: &mut VehicleState,
        sample: &SensorSample,
        speeds: Speeds,
        now: Instant,
    ) -> Option<CommandBatch> {
        debug_assert_eq!(state.status, Status::Grabbing);
        if state.maneuver_triggered {
            return None;
        }

        state.timer.start(now);
        // Written as "not closer" so an invalid (NaN) reading never grabs
        if !(sample.distance_cm < self.tuning.grab_distance_cm) {
            return None;
        }

        state.maneuver_triggered = true;
        state.timer.stop(now);
        let approach = state.timer.elapsed();
        info!(
            distance_cm = sample.distance_cm,
            approach_ms = approach.as_millis() as u64,
            "Object in reach, running pickup maneuver"
        );
        Some(self.sequence(state.polarity, speeds, approach))
    }

    /// The fixed grab, retreat and rotate sequence
    pub fn sequence(&self, polarity: Polarity, speeds: Speeds, retreat: Duration) -> CommandBatch {
        let drive = speeds.drive;
        let rotate = drive
            .saturating_mul(polarity.sign())
            .saturating_add(self.tuning.rotate_speed_offset);

        [
            MotorCommand::brake(ChannelSet::DRIVE),
            MotorCommand::set_speed(MotorChannel::Gripper, speeds.gripper),
            MotorCommand::wait(self.tuning.gripper_close()),
            MotorCommand::brake(MotorChannel::Gripper),
            MotorCommand::set_speed(ChannelSet::DRIVE, drive.saturating_neg()),
            MotorCommand::wait(retreat),
            MotorCommand::brake(ChannelSet::DRIVE),
            MotorCommand::set_speed(MotorChannel::Left, rotate),
            MotorCommand::wait(self.tuning.rotate()),
            MotorCommand::brake(MotorChannel::Left),
            MotorCommand::set_speed(ChannelSet::DRIVE, drive),
        ]
        .into_iter()
        .collect()
    }
}

impl Default for PickupManeuver {
    fn default() -> Self {
        Self::new(ManeuverTuning::default())
    }
}
