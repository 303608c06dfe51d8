//! Driver layer
//!
//! Everything between the control core and the motors:
//! - the [`MotorActuator`] seam implemented by the transport
//! - ordered, cancellable execution of command batches
//! - command hooks (recording, custom callbacks)
//! - the link watchdog
//!
//! The driver knows nothing about vehicle status or line following; it only
//! moves [`MotorCommand`](agv_protocol::MotorCommand)s to an actuator in
//! order and reports what happened.

pub mod actuator;
pub mod command;
mod error;
pub mod executor;
pub mod heartbeat;
pub mod hooks;
#[cfg(feature = "mock")]
pub mod mock;
pub mod recording;

pub use actuator::{CancelToken, MotorActuator};
pub use command::CommandBatch;
pub use error::DriverError;
pub use executor::execute_batch;
pub use heartbeat::{LinkEvent, LinkMonitor};
pub use hooks::{CommandCallback, HookManager};
#[cfg(feature = "mock")]
pub use mock::{MockActuator, MockHandle};
pub use recording::{RecordingHook, TimestampedCommand};
