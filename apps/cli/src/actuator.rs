//! Dry-run actuator
//!
//! Stands in for the vehicle's motor link during replay: every command is
//! logged and counted. Holds either block for their full duration (honoring
//! Ctrl+C) or are skipped when replaying unpaced.

use agv_sdk::driver::{CancelToken, DriverError, MotorActuator};
use agv_sdk::protocol::ChannelSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

pub struct LoggingActuator {
    real_waits: bool,
    sent: Arc<AtomicUsize>,
}

impl LoggingActuator {
    pub fn new(real_waits: bool) -> Self {
        Self {
            real_waits,
            sent: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of acknowledged commands
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.sent.clone()
    }

    fn acknowledge(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }
}

impl MotorActuator for LoggingActuator {
    fn set_speed(&mut self, channels: ChannelSet, speed: i32) -> Result<(), DriverError> {
        info!("motor {} speed {}", channels, speed);
        self.acknowledge();
        Ok(())
    }

    fn stop(&mut self, channels: ChannelSet, brake: bool) -> Result<(), DriverError> {
        info!(
            "motor {} stop ({})",
            channels,
            if brake { "brake" } else { "coast" }
        );
        self.acknowledge();
        Ok(())
    }

    fn wait(&mut self, duration: Duration, cancel: &CancelToken) -> Result<(), DriverError> {
        info!("hold {:?}", duration);
        if self.real_waits {
            cancel.wait(duration)?;
        } else {
            cancel.check()?;
        }
        self.acknowledge();
        Ok(())
    }
}
