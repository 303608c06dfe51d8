//! Vehicle run state
//!
//! Everything the control loop mutates lives in [`VehicleState`], owned by
//! [`VehicleStateMachine`](crate::VehicleStateMachine). Components receive it
//! by `&mut` for the duration of one tick and never keep it.

use crate::control::ElapsedTimer;
use agv_protocol::{LineColor, SensorSample};
use agv_tools::SteeringTuning;
use std::fmt;
use tracing::info;

/// Vehicle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Waiting,
    /// Reserved for obstacle handling; nothing enters it automatically
    PathBlocked,
    FindingPolarity,
    FindingPath,
    MovingToPickup,
    Grabbing,
    MovingToDropoff,
    Dropping,
    /// Reserved for the return leg; nothing enters it automatically
    MovingToEnd,
}

impl Status {
    pub const ALL: [Status; 9] = [
        Status::Waiting,
        Status::PathBlocked,
        Status::FindingPolarity,
        Status::FindingPath,
        Status::MovingToPickup,
        Status::Grabbing,
        Status::MovingToDropoff,
        Status::Dropping,
        Status::MovingToEnd,
    ];

    /// Operator-facing text
    pub fn text(self) -> &'static str {
        match self {
            Status::Waiting => "Waiting",
            Status::PathBlocked => "Path is blocked",
            Status::FindingPolarity => "Finding polarity",
            Status::FindingPath => "Finding path",
            Status::MovingToPickup => "Moving to pickup area",
            Status::Grabbing => "Grabbing object",
            Status::MovingToDropoff => "Moving to dropoff area",
            Status::Dropping => "Dropping object",
            Status::MovingToEnd => "Moving to end point",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Steering handedness, discovered once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    #[default]
    Unknown,
    Negative,
    Positive,
}

impl Polarity {
    /// 0, -1 or +1
    pub fn sign(self) -> i32 {
        match self {
            Polarity::Unknown => 0,
            Polarity::Negative => -1,
            Polarity::Positive => 1,
        }
    }

    pub fn is_known(self) -> bool {
        self != Polarity::Unknown
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sign())
    }
}

/// Accumulated off-line correction
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TurnBias(f64);

impl TurnBias {
    pub fn new(value: f64) -> Self {
        TurnBias(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Integer multiplier applied to the drive speed
    pub fn multiplier(self) -> i32 {
        self.0.floor() as i32
    }

    pub(crate) fn increase(&mut self, step: f64) {
        self.0 += step;
    }
}

impl fmt::Display for TurnBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// All mutable run state
#[derive(Debug, Clone)]
pub struct VehicleState {
    pub(crate) status: Status,
    pub(crate) polarity: Polarity,
    pub(crate) turn_bias: TurnBias,
    /// Marker color of the last straighten correction
    pub(crate) last_color: Option<LineColor>,
    pub(crate) timer: ElapsedTimer,
    pub(crate) maneuver_triggered: bool,
    pub(crate) started: bool,
    pub(crate) last_sample: Option<SensorSample>,
}

impl VehicleState {
    pub fn new(steering: &SteeringTuning) -> Self {
        Self {
            status: Status::Waiting,
            polarity: Polarity::Unknown,
            turn_bias: TurnBias::new(steering.base_turn_bias),
            last_color: None,
            timer: ElapsedTimer::new(),
            maneuver_triggered: false,
            started: false,
            last_sample: None,
        }
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        if self.status != status {
            info!("Status: {} -> {}", self.status, status);
            self.status = status;
        }
    }

    pub(crate) fn reset_turn_bias(&mut self, steering: &SteeringTuning) {
        self.turn_bias = TurnBias::new(steering.base_turn_bias);
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn turn_bias(&self) -> TurnBias {
        self.turn_bias
    }

    pub fn last_color(&self) -> Option<LineColor> {
        self.last_color
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn maneuver_triggered(&self) -> bool {
        self.maneuver_triggered
    }

    pub fn last_sample(&self) -> Option<SensorSample> {
        self.last_sample
    }
}

/// Read-only view published to presentation observers
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub status: Status,
    pub polarity: Polarity,
    pub turn_bias: f64,
    pub started: bool,
    pub last_sample: Option<SensorSample>,
    /// Whether the start control should be offered (vehicle is on the line)
    pub start_enabled: bool,
}

impl VehicleSnapshot {
    /// Detected color name of the last sample
    pub fn color_name(&self) -> &'static str {
        self.last_sample
            .map(|s| s.line_color.name())
            .unwrap_or(LineColor::Other.name())
    }

    /// Status line as shown to the operator
    pub fn status_line(&self) -> String {
        format!("Roboto Status: {}", self.status)
    }
}

impl Default for VehicleSnapshot {
    fn default() -> Self {
        Self {
            status: Status::Waiting,
            polarity: Polarity::Unknown,
            turn_bias: SteeringTuning::default().base_turn_bias,
            started: false,
            last_sample: None,
            start_enabled: false,
        }
    }
}

impl From<&VehicleState> for VehicleSnapshot {
    fn from(state: &VehicleState) -> Self {
        Self {
            status: state.status,
            polarity: state.polarity,
            turn_bias: state.turn_bias.value(),
            started: state.started,
            last_sample: state.last_sample,
            start_enabled: state
                .last_sample
                .is_some_and(|s| s.line_color == LineColor::Black),
        }
    }
}

impl fmt::Display for VehicleSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Polarity {} Turn Vector {:.1} | {}",
            self.status,
            self.polarity,
            self.turn_bias,
            self.color_name()
        )
    }
}
