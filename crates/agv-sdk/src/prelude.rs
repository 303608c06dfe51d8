//! Common imports
//!
//! ```rust
//! use agv_sdk::prelude::*;
//! ```

pub use agv_client::{
    Advisory, LoggingObserver, OperatorSpeeds, Orchestrator, Polarity, PresentationObserver,
    SpeedSource, Status, Vehicle, VehicleSnapshot,
};
pub use agv_driver::{CommandCallback, MotorActuator, RecordingHook};
pub use agv_protocol::{ChannelSet, LineColor, MotorChannel, MotorCommand, SensorSample};
pub use agv_tools::{SampleTrace, VehicleTuning};

pub use agv_client::VehicleError;
pub use agv_driver::DriverError;
