//! Control components
//!
//! The pieces the state machine runs each tick. None of them performs I/O;
//! they read and update a borrowed [`VehicleState`](crate::VehicleState) and
//! return the commands to send.

pub mod follower;
pub mod maneuver;
pub mod polarity;
pub mod timer;

pub use follower::LineFollower;
pub use maneuver::PickupManeuver;
pub use polarity::PolarityResolver;
pub use timer::ElapsedTimer;

/// Effective operator speeds for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Speeds {
    pub drive: i32,
    pub gripper: i32,
}

impl Speeds {
    pub const fn new(drive: i32, gripper: i32) -> Self {
        Self { drive, gripper }
    }
}
