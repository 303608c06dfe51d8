//! Operator speed input
//!
//! The operator types the drive and gripper speeds as free text. Both are
//! re-read on every tick, so an edit applies from the next sample on. Bad
//! input never stops the vehicle loop: it resolves to speed 0 and an
//! advisory.

use arc_swap::ArcSwap;
use std::sync::Arc;
use thiserror::Error;

/// Rejected speed text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid speed value")]
    NotANumber(String),
    #[error("Invalid speed (value < 0)")]
    Negative(i64),
    #[error("Motor won't move (speed = 0)")]
    Zero,
}

/// Parse operator speed text
///
/// # Example
/// ```
/// # use agv_client::config::{parse_speed, ConfigurationError};
/// assert_eq!(parse_speed(" 25 "), Ok(25));
/// assert_eq!(parse_speed("0"), Err(ConfigurationError::Zero));
/// ```
pub fn parse_speed(text: &str) -> Result<i32, ConfigurationError> {
    let trimmed = text.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ConfigurationError::NotANumber(trimmed.to_string()))?;
    if value < 0 {
        return Err(ConfigurationError::Negative(value));
    }
    if value == 0 {
        return Err(ConfigurationError::Zero);
    }
    i32::try_from(value).map_err(|_| ConfigurationError::NotANumber(trimmed.to_string()))
}

/// Speed used by the controller; 0 whenever the text is rejected
pub fn effective_speed(text: &str) -> (i32, Option<ConfigurationError>) {
    match parse_speed(text) {
        Ok(speed) => (speed, None),
        Err(e) => (0, Some(e)),
    }
}

/// Which operator speed a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedField {
    Drive,
    Gripper,
}

impl std::fmt::Display for SpeedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedField::Drive => f.write_str("drive"),
            SpeedField::Gripper => f.write_str("gripper"),
        }
    }
}

/// Source of the operator's raw speed text
pub trait SpeedSource: Send + Sync {
    fn drive_speed(&self) -> String;
    fn gripper_speed(&self) -> String;
}

impl<T: SpeedSource + ?Sized> SpeedSource for Arc<T> {
    fn drive_speed(&self) -> String {
        (**self).drive_speed()
    }

    fn gripper_speed(&self) -> String {
        (**self).gripper_speed()
    }
}

/// Speed inputs shared between the operator and the control loop
///
/// Reads are lock-free; writers replace the whole text.
#[derive(Debug)]
pub struct OperatorSpeeds {
    drive: ArcSwap<String>,
    gripper: ArcSwap<String>,
}

impl OperatorSpeeds {
    pub fn new(drive: impl Into<String>, gripper: impl Into<String>) -> Self {
        Self {
            drive: ArcSwap::from_pointee(drive.into()),
            gripper: ArcSwap::from_pointee(gripper.into()),
        }
    }

    pub fn set_drive(&self, text: impl Into<String>) {
        self.drive.store(Arc::new(text.into()));
    }

    pub fn set_gripper(&self, text: impl Into<String>) {
        self.gripper.store(Arc::new(text.into()));
    }
}

impl SpeedSource for OperatorSpeeds {
    fn drive_speed(&self) -> String {
        self.drive.load().as_ref().clone()
    }

    fn gripper_speed(&self) -> String {
        self.gripper.load().as_ref().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse_speed("20"), Ok(20));
        assert_eq!(parse_speed("  7\n"), Ok(7));
        assert_eq!(parse_speed("+15"), Ok(15));
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(
            parse_speed("abc"),
            Err(ConfigurationError::NotANumber("abc".to_string()))
        );
        assert_eq!(
            parse_speed(""),
            Err(ConfigurationError::NotANumber(String::new()))
        );
        assert_eq!(parse_speed("2.5").ok(), None);
        assert_eq!(parse_speed("-3"), Err(ConfigurationError::Negative(-3)));
        assert_eq!(parse_speed("0"), Err(ConfigurationError::Zero));
        assert!(matches!(
            parse_speed("99999999999"),
            Err(ConfigurationError::NotANumber(_))
        ));
    }

    #[test]
    fn test_advisory_texts() {
        assert_eq!(
            ConfigurationError::NotANumber("x".into()).to_string(),
            "Invalid speed value"
        );
        assert_eq!(
            ConfigurationError::Negative(-1).to_string(),
            "Invalid speed (value < 0)"
        );
        assert_eq!(
            ConfigurationError::Zero.to_string(),
            "Motor won't move (speed = 0)"
        );
    }

    #[test]
    fn test_effective_speed() {
        assert_eq!(effective_speed("12"), (12, None));
        let (speed, err) = effective_speed("abc");
        assert_eq!(speed, 0);
        assert!(matches!(err, Some(ConfigurationError::NotANumber(_))));
    }

    #[test]
    fn test_operator_speeds_update() {
        let speeds = Arc::new(OperatorSpeeds::new("20", "30"));
        assert_eq!(speeds.drive_speed(), "20");
        assert_eq!(speeds.gripper_speed(), "30");

        let writer = Arc::clone(&speeds);
        std::thread::spawn(move || writer.set_drive("45"))
            .join()
            .unwrap();
        assert_eq!(speeds.drive_speed(), "45");

        speeds.set_gripper("x");
        assert_eq!(speeds.gripper_speed(), "x");
    }
}
