//! Client error types

use agv_driver::DriverError;
use agv_tools::{TraceError, TuningError};
use thiserror::Error;

/// Errors returned by the orchestrator and the vehicle handle
///
/// Configuration problems with the operator speeds are not errors: they are
/// absorbed into an advisory and speed 0.
#[derive(Error, Debug)]
pub enum VehicleError {
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Tuning error: {0}")]
    Tuning(#[from] TuningError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    /// The control thread could not be started
    #[error("Failed to spawn control thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl VehicleError {
    /// Whether the error is a stop request rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VehicleError::Driver(DriverError::Cancelled))
    }
}

pub type Result<T> = std::result::Result<T, VehicleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use agv_protocol::ChannelSet;

    #[test]
    fn test_vehicle_error_from_driver() {
        let err: VehicleError = DriverError::actuator(ChannelSet::LEFT, "timeout").into();
        assert!(format!("{}", err).contains("Actuator failure"));
        assert!(!err.is_cancelled());

        let err: VehicleError = DriverError::Cancelled.into();
        assert!(err.is_cancelled());
    }
}
