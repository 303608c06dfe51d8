//! Line following
//!
//! Proportional correction around the black line. Every tick off the line on
//! a marker color grows the turn bias; the side chosen by polarity is then
//! driven backwards at `drive * floor(bias)`, where the bias is the value from
//! before this tick's increment. Black straightens both sides and resets the
//! bias. White carries no steering; it is the state trigger for the pickup
//! and dropoff areas.

use crate::state::{Polarity, Status, VehicleState};
use agv_driver::CommandBatch;
use agv_protocol::{LineColor, MotorChannel, MotorCommand, SensorSample};
use agv_tools::SteeringTuning;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LineFollower {
    steering: SteeringTuning,
}

impl LineFollower {
    pub fn new(steering: SteeringTuning) -> Self {
        Self { steering }
    }

    pub fn steering(&self) -> &SteeringTuning {
        &self.steering
    }

    /// Commands for one line-following tick
    ///
    /// Emits nothing while polarity is unknown.
    pub fn follow(
        &self,
        state: &mut VehicleState,
        sample: &SensorSample,
        drive: i32,
    ) -> CommandBatch {
        let mut batch = CommandBatch::new();
        if !state.polarity.is_known() {
            return batch;
        }

        let magnitude = drive.saturating_mul(state.turn_bias.multiplier());

        match sample.line_color {
            LineColor::Black => {
                if state.status == Status::FindingPath {
                    state.set_status(Status::MovingToDropoff);
                }
                state.reset_turn_bias(&self.steering);
                state.last_color = None;
                batch.push(MotorCommand::set_speed(MotorChannel::Right, drive));
                batch.push(MotorCommand::set_speed(MotorChannel::Left, drive));
            },
            LineColor::Yellow | LineColor::Red => {
                if state.status == Status::FindingPath {
                    return batch;
                }
                let color = sample.line_color;
                if state.last_color != Some(color) {
                    batch.push(MotorCommand::set_speed(MotorChannel::Right, drive));
                    batch.push(MotorCommand::set_speed(MotorChannel::Left, drive));
                    state.last_color = Some(color);
                }
                state.turn_bias.increase(self.steering.turn_bias_step);
                batch.push(MotorCommand::set_speed(
                    Self::braking_side(color, state.polarity),
                    -magnitude,
                ));
                debug!(
                    color = %color,
                    bias = %state.turn_bias,
                    magnitude,
                    "off-line correction"
                );
            },
            LineColor::White => {
                state.last_color = None;
                self.white_trigger(state);
            },
            LineColor::Other => {
                state.last_color = None;
            },
        }

        batch
    }

    /// Bias clamp and area transitions on the neutral color
    fn white_trigger(&self, state: &mut VehicleState) {
        if state.turn_bias.value() > self.steering.turn_bias_ceiling {
            debug!(bias = %state.turn_bias, "turn bias above ceiling, reset");
            state.reset_turn_bias(&self.steering);
        }
        match state.status {
            Status::MovingToPickup => state.set_status(Status::Grabbing),
            Status::MovingToDropoff => state.set_status(Status::Dropping),
            _ => {},
        }
    }

    /// Side driven backwards for a marker color
    ///
    /// Yellow brakes the right side under positive polarity, Red the left.
    fn braking_side(color: LineColor, polarity: Polarity) -> MotorChannel {
        match (color, polarity) {
            (LineColor::Yellow, Polarity::Positive) | (LineColor::Red, Polarity::Negative) => {
                MotorChannel::Right
            },
            _ => MotorChannel::Left,
        }
    }
}

impl Default for LineFollower {
    fn default() -> Self {
        Self::new(SteeringTuning::default())
    }
}
