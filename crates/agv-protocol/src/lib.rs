//! # AGV Protocol
//!
//! Data types shared by every layer of the line follower, with no I/O.
//!
//! ## Modules
//!
//! - `sensor`: EV3 color codes, line color classes and decoded sensor samples
//! - `motor`: output channels and the motor commands the controller emits
//!
//! ## Port layout
//!
//! The chassis wires its motors to fixed EV3 output ports:
//!
//! ```text
//! Port B  -> left drive motor   (MotorChannel::Left)
//! Port C  -> gripper motor      (MotorChannel::Gripper)
//! Port D  -> right drive motor  (MotorChannel::Right)
//! ```
//!
//! Sensors sit on input port 2 (color, "color" mode) and input port 3
//! (ultrasonic, centimeters). Framing of those readings belongs to the
//! transport; this crate starts from the decoded values.

pub mod motor;
pub mod sensor;

pub use motor::{ChannelSet, MotorChannel, MotorCommand};
pub use sensor::{ColorCode, LineColor, SensorSample};

use thiserror::Error;

/// Protocol decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Color-mode reading outside the EV3 code range
    #[error("Invalid color code: {code} (expected 0..=7)")]
    InvalidColorCode { code: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidColorCode { code: 42 };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid color code"));
        assert!(msg.contains("42"));
    }
}
