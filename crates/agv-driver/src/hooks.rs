//! Command hooks
//!
//! Runtime callbacks fired by the executor after each acknowledged command.
//! Callbacks run on the control thread between actuator calls, so they must
//! not block: forward into a channel with `try_send` and do the real work
//! elsewhere (see [`RecordingHook`](crate::recording::RecordingHook)).

use agv_protocol::MotorCommand;
use std::sync::Arc;

/// Callback invoked for every command the actuator acknowledged
///
/// # Example
///
/// ```rust
/// use agv_driver::hooks::CommandCallback;
/// use agv_protocol::MotorCommand;
/// use crossbeam_channel::Sender;
///
/// struct Forward {
///     sender: Sender<MotorCommand>,
/// }
///
/// impl CommandCallback for Forward {
///     fn on_command_sent(&self, command: &MotorCommand) {
///         let _ = self.sender.try_send(*command);
///     }
/// }
/// ```
pub trait CommandCallback: Send + Sync {
    /// Called after `command` was acknowledged by the actuator
    fn on_command_sent(&self, command: &MotorCommand);

    /// Called when `command` failed; defaults to doing nothing
    fn on_command_failed(&self, command: &MotorCommand) {
        let _ = command;
    }
}

/// Registered command callbacks
#[derive(Default, Clone)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn CommandCallback>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn add_callback(&mut self, callback: Arc<dyn CommandCallback>) {
        self.callbacks.push(callback);
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub fn trigger_sent(&self, command: &MotorCommand) {
        for callback in self.callbacks.iter() {
            callback.on_command_sent(command);
        }
    }

    pub fn trigger_failed(&self, command: &MotorCommand) {
        for callback in self.callbacks.iter() {
            callback.on_command_failed(command);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agv_protocol::ChannelSet;
    use crossbeam_channel::{Sender, bounded};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct TestCallback {
        tx: Sender<MotorCommand>,
        failed: Arc<AtomicU64>,
    }

    impl CommandCallback for TestCallback {
        fn on_command_sent(&self, command: &MotorCommand) {
            let _ = self.tx.try_send(*command);
        }

        fn on_command_failed(&self, _command: &MotorCommand) {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_hook_manager_add_and_clear() {
        let mut hooks = HookManager::new();
        assert!(hooks.is_empty());

        let (tx, _rx) = bounded(4);
        hooks.add_callback(Arc::new(TestCallback {
            tx,
            failed: Arc::new(AtomicU64::new(0)),
        }));
        assert_eq!(hooks.len(), 1);

        hooks.clear();
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_hook_manager_triggers() {
        let mut hooks = HookManager::new();
        let (tx, rx) = bounded(4);
        let failed = Arc::new(AtomicU64::new(0));
        hooks.add_callback(Arc::new(TestCallback {
            tx,
            failed: failed.clone(),
        }));

        let cmd = MotorCommand::brake(ChannelSet::DRIVE);
        hooks.trigger_sent(&cmd);
        assert_eq!(rx.try_recv().unwrap(), cmd);

        hooks.trigger_failed(&cmd);
        assert_eq!(failed.load(Ordering::Relaxed), 1);
        assert!(rx.try_recv().is_err());
    }
}
