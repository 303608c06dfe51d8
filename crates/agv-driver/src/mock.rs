//! In-memory actuator
//!
//! Records every command it receives. Waits are recorded and skipped by
//! default so maneuvers run instantly in tests; [`MockActuator::with_real_waits`]
//! makes them block (and honor cancellation) like a real transport.
//!
//! The actuator usually moves into a control thread, so inspection goes
//! through a cloned [`MockHandle`].

use crate::{CancelToken, DriverError, MotorActuator};
use agv_protocol::{ChannelSet, MotorCommand};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct MockShared {
    log: Mutex<Vec<MotorCommand>>,
    /// Fail every command once this many have been acknowledged
    fail_after: AtomicUsize,
    fail_armed: AtomicBool,
}

/// Inspection and fault-injection handle shared with a [`MockActuator`]
#[derive(Clone, Default)]
pub struct MockHandle {
    shared: Arc<MockShared>,
}

impl MockHandle {
    fn log(&self) -> MutexGuard<'_, Vec<MotorCommand>> {
        // A panicking test thread must not hide the log from the asserting one
        self.shared.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All acknowledged commands, in order
    pub fn commands(&self) -> Vec<MotorCommand> {
        self.log().clone()
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    /// Make every command fail once `count` more commands have been acknowledged
    pub fn fail_after(&self, count: usize) {
        let acknowledged = self.len();
        self.shared
            .fail_after
            .store(acknowledged + count, Ordering::SeqCst);
        self.shared.fail_armed.store(true, Ordering::SeqCst);
    }

    /// Let commands through again
    pub fn heal(&self) {
        self.shared.fail_armed.store(false, Ordering::SeqCst);
    }
}

/// Recording actuator for tests and dry runs
pub struct MockActuator {
    handle: MockHandle,
    real_waits: bool,
}

impl MockActuator {
    pub fn new() -> (Self, MockHandle) {
        let handle = MockHandle::default();
        (
            Self {
                handle: handle.clone(),
                real_waits: false,
            },
            handle,
        )
    }

    /// Block for the full duration of each `Wait`
    pub fn with_real_waits(mut self) -> Self {
        self.real_waits = true;
        self
    }

    fn acknowledge(&mut self, command: MotorCommand) -> Result<(), DriverError> {
        let shared = &self.handle.shared;
        let mut log = self.handle.log();
        if shared.fail_armed.load(Ordering::SeqCst)
            && log.len() >= shared.fail_after.load(Ordering::SeqCst)
        {
            return Err(DriverError::actuator(command.channels(), "mock link down"));
        }
        log.push(command);
        Ok(())
    }
}

impl MotorActuator for MockActuator {
    fn set_speed(&mut self, channels: ChannelSet, speed: i32) -> Result<(), DriverError> {
        self.acknowledge(MotorCommand::SetSpeed { channels, speed })
    }

    fn stop(&mut self, channels: ChannelSet, brake: bool) -> Result<(), DriverError> {
        self.acknowledge(MotorCommand::Stop { channels, brake })
    }

    fn wait(&mut self, duration: Duration, cancel: &CancelToken) -> Result<(), DriverError> {
        if self.real_waits {
            cancel.wait(duration)?;
        } else {
            cancel.check()?;
        }
        self.acknowledge(MotorCommand::Wait(duration))
    }
}
