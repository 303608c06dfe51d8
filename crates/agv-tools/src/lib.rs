//! # AGV Tools
//!
//! Serializable support data shared by the controller and the CLI.
//!
//! - `tuning`: control constants loaded from a TOML file
//! - `trace`: recorded sensor sample streams for replay
//!
//! Depends on `agv-protocol` only.

pub mod trace;
pub mod tuning;

pub use trace::{ColorSpec, SampleTrace, TraceError, TraceSample};
pub use tuning::{
    LinkTuning, ManeuverTuning, StartTuning, SteeringTuning, TuningError, VehicleTuning,
};
