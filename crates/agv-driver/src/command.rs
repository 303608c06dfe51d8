//! Command batches
//!
//! A tick emits exactly one batch. Batches are small: a line-following tick
//! emits at most four commands, the pickup maneuver eleven, so the inline
//! capacity of 12 keeps every batch on the stack.

use agv_protocol::{ChannelSet, MotorCommand};
use smallvec::SmallVec;
use std::time::Duration;

/// Inline storage for one tick's commands
pub type CommandBuffer = SmallVec<[MotorCommand; 12]>;

/// Ordered motor commands emitted by one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBatch {
    commands: CommandBuffer,
}

impl CommandBatch {
    #[inline]
    pub fn new() -> Self {
        Self {
            commands: CommandBuffer::new(),
        }
    }

    #[inline]
    pub fn single(command: MotorCommand) -> Self {
        let mut batch = Self::new();
        batch.push(command);
        batch
    }

    #[inline]
    pub fn push(&mut self, command: MotorCommand) {
        self.commands.push(command);
    }

    /// Append all commands of `other`, preserving order
    pub fn extend(&mut self, other: CommandBatch) {
        self.commands.extend(other.commands);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &MotorCommand> {
        self.commands.iter()
    }

    pub fn as_slice(&self) -> &[MotorCommand] {
        &self.commands
    }

    /// Sum of all `Wait` holds in the batch
    pub fn total_wait(&self) -> Duration {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                MotorCommand::Wait(d) => Some(*d),
                _ => None,
            })
            .sum()
    }

    /// Whether any command drives the given channels at a nonzero speed
    pub fn moves(&self, channels: ChannelSet) -> bool {
        self.commands.iter().any(|cmd| match cmd {
            MotorCommand::SetSpeed { channels: ch, speed } => {
                *speed != 0 && ch.iter().any(|c| channels.contains(c))
            },
            _ => false,
        })
    }
}

impl FromIterator<MotorCommand> for CommandBatch {
    fn from_iter<I: IntoIterator<Item = MotorCommand>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CommandBatch {
    type Item = MotorCommand;
    type IntoIter = smallvec::IntoIter<[MotorCommand; 12]>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandBatch {
    type Item = &'a MotorCommand;
    type IntoIter = std::slice::Iter<'a, MotorCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
