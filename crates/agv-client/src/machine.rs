//! Vehicle state machine
//!
//! One sample in, one command batch out. [`VehicleStateMachine::tick`]
//! performs no I/O: it updates the run state and returns a [`Tick`] that the
//! caller executes and then hands back to [`VehicleStateMachine::commit`].
//!
//! Per tick, in order:
//! 1. polarity discovery (started runs only)
//! 2. `Grabbing`: the pickup maneuver; if it fires its batch is the whole tick
//! 3. `Dropping`: hold the drive motors and do nothing else
//! 4. otherwise line following, including the White trigger

use crate::control::{LineFollower, PickupManeuver, PolarityResolver, Speeds};
use crate::state::{Polarity, Status, TurnBias, VehicleSnapshot, VehicleState};
use agv_driver::CommandBatch;
use agv_protocol::{ChannelSet, MotorChannel, MotorCommand, SensorSample};
use agv_tools::{StartTuning, SteeringTuning, VehicleTuning};
use std::time::Instant;
use tracing::{debug, info};

/// Output of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tick {
    /// Commands to execute, in order
    pub commands: CommandBatch,
    /// Status to apply once every command was acknowledged
    pub on_complete: Option<Status>,
    /// Whether this tick carries the pickup maneuver
    pub maneuver_fired: bool,
}

impl Tick {
    fn commands(commands: CommandBatch) -> Self {
        Self {
            commands,
            ..Self::default()
        }
    }
}

pub struct VehicleStateMachine {
    state: VehicleState,
    steering: SteeringTuning,
    start: StartTuning,
    resolver: PolarityResolver,
    follower: LineFollower,
    maneuver: PickupManeuver,
}

impl VehicleStateMachine {
    pub fn new(tuning: &VehicleTuning) -> Self {
        Self {
            state: VehicleState::new(&tuning.steering),
            steering: tuning.steering.clone(),
            start: tuning.start.clone(),
            resolver: PolarityResolver,
            follower: LineFollower::new(tuning.steering.clone()),
            maneuver: PickupManeuver::new(tuning.maneuver.clone()),
        }
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn polarity(&self) -> Polarity {
        self.state.polarity
    }

    pub fn turn_bias(&self) -> TurnBias {
        self.state.turn_bias
    }

    pub fn is_started(&self) -> bool {
        self.state.started
    }

    /// Begin a run
    ///
    /// Returns the nudge that gets the vehicle moving onto the markers.
    pub fn start(&mut self) -> CommandBatch {
        info!("Run started");
        self.state.started = true;
        self.state.set_status(Status::FindingPolarity);
        CommandBatch::single(MotorCommand::set_speed(
            MotorChannel::Right,
            self.start.nudge_speed,
        ))
    }

    /// Back to the initial state; keeps the last sample for display
    pub fn reset(&mut self) {
        let last_sample = self.state.last_sample;
        if self.state.status != Status::Waiting {
            info!("Status: {} -> {} (reset)", self.state.status, Status::Waiting);
        }
        self.state = VehicleState::new(&self.steering);
        self.state.last_sample = last_sample;
    }

    /// Process one sensor sample
    pub fn tick(&mut self, sample: &SensorSample, speeds: Speeds, now: Instant) -> Tick {
        self.state.last_sample = Some(*sample);
        self.resolver.resolve(&mut self.state, sample);

        match self.state.status {
            Status::Grabbing => {
                if let Some(commands) = self.maneuver.poll(&mut self.state, sample, speeds, now) {
                    return Tick {
                        commands,
                        on_complete: Some(Status::FindingPath),
                        maneuver_fired: true,
                    };
                }
            },
            Status::Dropping => {
                return Tick::commands(CommandBatch::single(MotorCommand::brake(
                    ChannelSet::DRIVE,
                )));
            },
            _ => {},
        }

        let commands = self.follower.follow(&mut self.state, sample, speeds.drive);
        debug!(
            color = %sample.line_color,
            distance_cm = sample.distance_cm,
            status = %self.state.status,
            bias = %self.state.turn_bias,
            commands = commands.len(),
            "tick"
        );
        Tick::commands(commands)
    }

    /// Apply the deferred part of an executed tick
    pub fn commit(&mut self, tick: &Tick) {
        if let Some(status) = tick.on_complete {
            self.state.set_status(status);
        }
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot::from(&self.state)
    }
}

impl Default for VehicleStateMachine {
    fn default() -> Self {
        Self::new(&VehicleTuning::default())
    }
}
