//! Presentation observers
//!
//! Observers are passive: they receive a snapshot after every handled event
//! and every advisory, and nothing they do feeds back into the control loop.
//! Callbacks run on the control thread, so implementations must return
//! quickly.

use crate::config::{ConfigurationError, SpeedField};
use crate::state::{Status, VehicleSnapshot};
use agv_driver::DriverError;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// User-visible informational message
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    /// Operator speed text was rejected; the speed is treated as 0
    Configuration {
        field: SpeedField,
        error: ConfigurationError,
    },
    /// A motor command failed; the batch in progress was aborted
    ActuatorFailure(DriverError),
    /// No sensor sample within the link timeout
    LinkTimeout(Duration),
    /// Samples are arriving again
    LinkRestored,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::Configuration { error, .. } => write!(f, "Status: {}", error),
            Advisory::ActuatorFailure(e) => write!(f, "Status: Motor command failed ({})", e),
            Advisory::LinkTimeout(_) => f.write_str("Status: Connection timed out"),
            Advisory::LinkRestored => f.write_str("Status: Connected"),
        }
    }
}

pub trait PresentationObserver: Send + Sync {
    fn on_snapshot(&self, snapshot: &VehicleSnapshot);

    fn on_advisory(&self, _advisory: &Advisory) {}
}

/// Observer that logs status changes at `info`
///
/// Advisories are already logged by the orchestrator.
#[derive(Default)]
pub struct LoggingObserver {
    last_status: Mutex<Option<Status>>,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationObserver for LoggingObserver {
    fn on_snapshot(&self, snapshot: &VehicleSnapshot) {
        let mut last = self.last_status.lock().unwrap_or_else(|e| e.into_inner());
        if *last != Some(snapshot.status) {
            info!("{}", snapshot.status_line());
            *last = Some(snapshot.status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agv_protocol::ChannelSet;

    #[test]
    fn test_advisory_display() {
        let advisory = Advisory::Configuration {
            field: SpeedField::Drive,
            error: ConfigurationError::NotANumber("abc".into()),
        };
        assert_eq!(advisory.to_string(), "Status: Invalid speed value");

        let advisory = Advisory::ActuatorFailure(DriverError::actuator(ChannelSet::DRIVE, "nak"));
        assert!(advisory.to_string().contains("Motor command failed"));

        assert_eq!(
            Advisory::LinkTimeout(Duration::from_secs(10)).to_string(),
            "Status: Connection timed out"
        );
    }

    #[test]
    fn test_logging_observer_tracks_status() {
        let observer = LoggingObserver::new();
        let mut snapshot = VehicleSnapshot::default();
        observer.on_snapshot(&snapshot);
        snapshot.status = Status::FindingPolarity;
        observer.on_snapshot(&snapshot);
        assert_eq!(
            *observer.last_status.lock().unwrap(),
            Some(Status::FindingPolarity)
        );
    }
}
