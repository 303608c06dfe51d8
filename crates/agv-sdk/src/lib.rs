//! # AGV SDK
//!
//! Line-following controller for an EV3-based autonomous guided vehicle.
//!
//! The vehicle follows a black line, discovers its steering polarity from the
//! first marker color (yellow or red), picks up an object in the white pickup
//! area and carries it to the dropoff area. This crate re-exports the layered
//! crates behind one facade:
//!
//! - **protocol** (`protocol`): sensor samples and motor commands
//! - **driver** (`driver`): actuator seam, batch execution, hooks, link watchdog
//! - **client** (`client`): state machine, orchestrator, vehicle handle
//! - **tools** (`tools`): tuning and trace files
//!
//! # Quick start
//!
//! ```rust,ignore
//! use agv_sdk::prelude::*;
//! use std::sync::Arc;
//!
//! agv_sdk::init_logger();
//! let speeds = Arc::new(OperatorSpeeds::new("20", "30"));
//! let vehicle = Vehicle::spawn(my_actuator, speeds, &VehicleTuning::default())?;
//! vehicle.start()?;
//! ```

pub use agv_client as client;
pub use agv_driver as driver;
pub use agv_protocol as protocol;
pub use agv_tools as tools;

pub mod prelude;

pub use agv_protocol::{
    ChannelSet, LineColor, MotorChannel, MotorCommand, ProtocolError, SensorSample,
};

pub use agv_driver::{CancelToken, CommandBatch, DriverError, MotorActuator};

pub use agv_client::{
    Advisory, ConfigurationError, OperatorSpeeds, Orchestrator, Polarity, PresentationObserver,
    SpeedSource, Status, Vehicle, VehicleError, VehicleSnapshot, VehicleStateMachine,
};

pub use agv_tools::{SampleTrace, VehicleTuning};

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global `tracing` subscriber
///
/// Honors `RUST_LOG` (default `info`) and forwards `log` records from
/// dependencies. Calling it more than once is harmless; only the first call
/// installs anything.
pub fn init_logger() {
    // Already installed by a previous call or by the host application
    let _ = tracing_log::LogTracer::init();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        log::debug!("global tracing subscriber already set");
    }
}
