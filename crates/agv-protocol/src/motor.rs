//! Motor channels and commands

use std::fmt;
use std::ops::BitOr;
use std::time::Duration;

/// Addressable output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorChannel {
    /// Left drive motor (port B)
    Left,
    /// Right drive motor (port D)
    Right,
    /// Gripper motor (port C)
    Gripper,
}

impl MotorChannel {
    const fn bit(self) -> u8 {
        match self {
            MotorChannel::Left => 0b001,
            MotorChannel::Right => 0b010,
            MotorChannel::Gripper => 0b100,
        }
    }

    /// EV3 output port letter
    pub fn port(self) -> char {
        match self {
            MotorChannel::Left => 'B',
            MotorChannel::Right => 'D',
            MotorChannel::Gripper => 'C',
        }
    }
}

/// Set of output channels addressed by a single command
///
/// Bit 0 = left, bit 1 = right, bit 2 = gripper.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelSet(u8);

impl ChannelSet {
    pub const EMPTY: ChannelSet = ChannelSet(0);
    pub const LEFT: ChannelSet = ChannelSet(MotorChannel::Left.bit());
    pub const RIGHT: ChannelSet = ChannelSet(MotorChannel::Right.bit());
    pub const GRIPPER: ChannelSet = ChannelSet(MotorChannel::Gripper.bit());
    /// Both drive motors
    pub const DRIVE: ChannelSet = ChannelSet(MotorChannel::Left.bit() | MotorChannel::Right.bit());

    pub fn contains(self, channel: MotorChannel) -> bool {
        self.0 & channel.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Channels in port order (left, right, gripper)
    pub fn iter(self) -> impl Iterator<Item = MotorChannel> {
        [MotorChannel::Left, MotorChannel::Right, MotorChannel::Gripper]
            .into_iter()
            .filter(move |ch| self.contains(*ch))
    }
}

impl From<MotorChannel> for ChannelSet {
    fn from(channel: MotorChannel) -> Self {
        ChannelSet(channel.bit())
    }
}

impl BitOr for ChannelSet {
    type Output = ChannelSet;

    fn bitor(self, rhs: ChannelSet) -> ChannelSet {
        ChannelSet(self.0 | rhs.0)
    }
}

impl BitOr for MotorChannel {
    type Output = ChannelSet;

    fn bitor(self, rhs: MotorChannel) -> ChannelSet {
        ChannelSet(self.bit() | rhs.bit())
    }
}

impl fmt::Debug for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for ch in self.iter() {
            write!(f, "{}", ch.port())?;
        }
        Ok(())
    }
}

/// A single actuator instruction
///
/// Commands are emitted in batches and must reach the actuator in order;
/// `Wait` holds the batch for the given duration before the next command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    /// Run the channels at a signed speed
    SetSpeed { channels: ChannelSet, speed: i32 },
    /// Stop the channels, braking or coasting
    Stop { channels: ChannelSet, brake: bool },
    /// Hold before issuing the next command
    Wait(Duration),
}

impl MotorCommand {
    pub fn set_speed(channels: impl Into<ChannelSet>, speed: i32) -> Self {
        MotorCommand::SetSpeed {
            channels: channels.into(),
            speed,
        }
    }

    pub fn brake(channels: impl Into<ChannelSet>) -> Self {
        MotorCommand::Stop {
            channels: channels.into(),
            brake: true,
        }
    }

    pub fn coast(channels: impl Into<ChannelSet>) -> Self {
        MotorCommand::Stop {
            channels: channels.into(),
            brake: false,
        }
    }

    pub fn wait(duration: Duration) -> Self {
        MotorCommand::Wait(duration)
    }

    /// Channels touched by this command (empty for `Wait`)
    pub fn channels(&self) -> ChannelSet {
        match self {
            MotorCommand::SetSpeed { channels, .. } | MotorCommand::Stop { channels, .. } => {
                *channels
            },
            MotorCommand::Wait(_) => ChannelSet::EMPTY,
        }
    }
}

impl fmt::Display for MotorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorCommand::SetSpeed { channels, speed } => write!(f, "speed {} {:+}", channels, speed),
            MotorCommand::Stop { channels, brake } => {
                write!(f, "stop {} ({})", channels, if *brake { "brake" } else { "coast" })
            },
            MotorCommand::Wait(d) => write!(f, "wait {}ms", d.as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_set_union() {
        let set = MotorChannel::Left | MotorChannel::Right;
        assert_eq!(set, ChannelSet::DRIVE);
        assert!(set.contains(MotorChannel::Left));
        assert!(set.contains(MotorChannel::Right));
        assert!(!set.contains(MotorChannel::Gripper));

        let all = set | ChannelSet::GRIPPER;
        assert_eq!(all.iter().count(), 3);
    }

    #[test]
    fn test_channel_set_display() {
        assert_eq!(format!("{}", ChannelSet::DRIVE), "BD");
        assert_eq!(format!("{}", ChannelSet::GRIPPER), "C");
        assert_eq!(format!("{}", ChannelSet::EMPTY), "-");
    }

    #[test]
    fn test_command_constructors() {
        assert_eq!(
            MotorCommand::set_speed(MotorChannel::Right, 20),
            MotorCommand::SetSpeed {
                channels: ChannelSet::RIGHT,
                speed: 20
            }
        );
        assert_eq!(
            MotorCommand::brake(ChannelSet::DRIVE),
            MotorCommand::Stop {
                channels: ChannelSet::DRIVE,
                brake: true
            }
        );
        assert!(MotorCommand::wait(Duration::from_millis(500)).channels().is_empty());
    }

    #[test]
    fn test_command_display() {
        assert_eq!(
            format!("{}", MotorCommand::set_speed(ChannelSet::DRIVE, -20)),
            "speed BD -20"
        );
        assert_eq!(
            format!("{}", MotorCommand::brake(MotorChannel::Gripper)),
            "stop C (brake)"
        );
        assert_eq!(
            format!("{}", MotorCommand::wait(Duration::from_secs(4))),
            "wait 4000ms"
        );
    }
}
