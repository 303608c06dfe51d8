//! Driver error types

use agv_protocol::ChannelSet;
use thiserror::Error;

/// Driver layer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// A motor command did not complete (transport failure)
    #[error("Actuator failure on {channels}: {reason}")]
    Actuator { channels: ChannelSet, reason: String },

    /// The link to the vehicle is gone
    #[error("Link lost")]
    LinkLost,

    /// The batch was cancelled by a stop request
    #[error("Cancelled by stop request")]
    Cancelled,

    /// Control channel closed (control thread exited)
    #[error("Control channel closed")]
    ChannelClosed,

    /// Control thread error
    #[error("Control thread error: {0}")]
    ControlThread(String),
}

impl DriverError {
    pub fn actuator(channels: ChannelSet, reason: impl Into<String>) -> Self {
        DriverError::Actuator {
            channels,
            reason: reason.into(),
        }
    }

    /// Whether a command failed to reach the actuator
    pub fn is_actuator_failure(&self) -> bool {
        matches!(self, DriverError::Actuator { .. } | DriverError::LinkLost)
    }
}
