//! # AGV Client
//!
//! The line-following control core and the layers that run it.
//!
//! - [`VehicleStateMachine`]: pure per-tick logic (polarity, line following,
//!   pickup maneuver, status transitions)
//! - [`Orchestrator`]: executes each tick against a
//!   [`MotorActuator`](agv_driver::MotorActuator) and publishes snapshots
//! - [`Vehicle`]: runs an orchestrator on its own control thread
//!
//! ```rust,ignore
//! use agv_client::{OperatorSpeeds, Vehicle};
//! use agv_tools::VehicleTuning;
//! use std::sync::Arc;
//!
//! let speeds = Arc::new(OperatorSpeeds::new("20", "30"));
//! let vehicle = Vehicle::spawn(actuator, speeds, &VehicleTuning::default())?;
//! vehicle.start()?;
//! // from the sensor callback:
//! vehicle.push_sample(sample)?;
//! ```

pub mod config;
pub mod control;
mod error;
pub mod machine;
pub mod observer;
pub mod orchestrator;
pub mod playback;
pub mod state;
pub mod vehicle;

pub use config::{ConfigurationError, OperatorSpeeds, SpeedField, SpeedSource, parse_speed};
pub use control::{ElapsedTimer, LineFollower, PickupManeuver, PolarityResolver, Speeds};
pub use error::{Result, VehicleError};
pub use machine::{Tick, VehicleStateMachine};
pub use observer::{Advisory, LoggingObserver, PresentationObserver};
pub use orchestrator::Orchestrator;
pub use playback::{PlaybackOptions, PlaybackReport, play_trace};
pub use state::{Polarity, Status, TurnBias, VehicleSnapshot, VehicleState};
pub use vehicle::{ControlEvent, Vehicle};
