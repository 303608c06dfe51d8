//! Batch executor
//!
//! Sends a batch to the actuator strictly in order. Each command is awaited
//! before the next one is issued; cancellation is checked before every
//! command and inside every wait. The first failure aborts the remainder of
//! the batch and is returned to the caller.

use crate::{CancelToken, CommandBatch, DriverError, HookManager, MotorActuator};
use agv_protocol::MotorCommand;
use tracing::{error, trace};

/// Execute `batch` against `actuator`
///
/// Returns the number of commands acknowledged when the whole batch went
/// through.
pub fn execute_batch<A: MotorActuator + ?Sized>(
    actuator: &mut A,
    batch: &CommandBatch,
    cancel: &CancelToken,
    hooks: &HookManager,
) -> Result<usize, DriverError> {
    for (index, command) in batch.iter().enumerate() {
        cancel.check()?;

        trace!(index, %command, "sending motor command");
        let result = match *command {
            MotorCommand::SetSpeed { channels, speed } => actuator.set_speed(channels, speed),
            MotorCommand::Stop { channels, brake } => actuator.stop(channels, brake),
            MotorCommand::Wait(duration) => actuator.wait(duration, cancel),
        };

        match result {
            Ok(()) => hooks.trigger_sent(command),
            Err(DriverError::Cancelled) => return Err(DriverError::Cancelled),
            Err(e) => {
                error!(index, %command, "motor command failed: {}", e);
                hooks.trigger_failed(command);
                return Err(e);
            },
        }
    }
    Ok(batch.len())
}
