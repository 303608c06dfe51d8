//! Command recording hook
//!
//! Forwards every acknowledged command into a bounded channel. When the
//! channel is full, commands are dropped and counted rather than blocking
//! the control thread.
//!
//! ```rust
//! use agv_driver::hooks::{CommandCallback, HookManager};
//! use agv_driver::recording::RecordingHook;
//! use std::sync::Arc;
//!
//! let (hook, rx) = RecordingHook::new();
//! let dropped = hook.dropped_commands().clone();
//!
//! let mut hooks = HookManager::new();
//! hooks.add_callback(Arc::new(hook) as Arc<dyn CommandCallback>);
//!
//! std::thread::spawn(move || {
//!     while let Ok(entry) = rx.recv() {
//!         println!("{:>8}us  {}", entry.elapsed_us, entry.command);
//!     }
//! });
//! # let _ = dropped;
//! ```

use crate::hooks::CommandCallback;
use agv_protocol::MotorCommand;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Default queue capacity
const RECORDING_CAPACITY: usize = 10_000;

/// Command with the time it was acknowledged, relative to hook creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedCommand {
    pub elapsed_us: u64,
    pub command: MotorCommand,
}

/// Channel-backed recording hook
pub struct RecordingHook {
    tx: Sender<TimestampedCommand>,
    origin: Instant,
    dropped_commands: Arc<AtomicU64>,
    command_counter: Arc<AtomicU64>,
}

impl RecordingHook {
    #[must_use]
    pub fn new() -> (Self, Receiver<TimestampedCommand>) {
        Self::with_capacity(RECORDING_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, Receiver<TimestampedCommand>) {
        let (tx, rx) = bounded(capacity);
        let hook = Self {
            tx,
            origin: Instant::now(),
            dropped_commands: Arc::new(AtomicU64::new(0)),
            command_counter: Arc::new(AtomicU64::new(0)),
        };
        (hook, rx)
    }

    /// Commands lost because the queue was full
    pub fn dropped_commands(&self) -> &Arc<AtomicU64> {
        &self.dropped_commands
    }

    /// Commands successfully queued
    pub fn command_counter(&self) -> &Arc<AtomicU64> {
        &self.command_counter
    }
}

impl CommandCallback for RecordingHook {
    fn on_command_sent(&self, command: &MotorCommand) {
        let entry = TimestampedCommand {
            elapsed_us: self.origin.elapsed().as_micros() as u64,
            command: *command,
        };
        if self.tx.try_send(entry).is_err() {
            self.dropped_commands.fetch_add(1, Ordering::Relaxed);
        } else {
            self.command_counter.fetch_add(1, Ordering::Relaxed);
        }
    }
}
