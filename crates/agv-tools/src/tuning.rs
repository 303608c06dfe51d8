//! # Vehicle tuning
//!
//! Control constants for the line follower. The defaults are the values the
//! vehicle was calibrated with; a TOML file may override any subset:
//!
//! ```toml
//! [steering]
//! turn_bias_step = 0.5
//!
//! [maneuver]
//! rotate_ms = 3500
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Tuning file errors
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid tuning file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize tuning: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid tuning value: {0}")]
    Invalid(String),
}

/// All control constants
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    pub steering: SteeringTuning,
    pub maneuver: ManeuverTuning,
    pub start: StartTuning,
    pub link: LinkTuning,
}

impl VehicleTuning {
    pub fn from_toml_str(content: &str) -> Result<Self, TuningError> {
        let tuning: VehicleTuning = toml::from_str(content)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_toml_string(&self) -> Result<String, TuningError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TuningError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TuningError> {
        self.validate()?;
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Reject values the controller cannot work with
    pub fn validate(&self) -> Result<(), TuningError> {
        let s = &self.steering;
        if !(s.base_turn_bias.is_finite() && s.base_turn_bias > 0.0) {
            return Err(TuningError::Invalid(format!(
                "steering.base_turn_bias must be > 0 (got {})",
                s.base_turn_bias
            )));
        }
        if !(s.turn_bias_step.is_finite() && s.turn_bias_step > 0.0) {
            return Err(TuningError::Invalid(format!(
                "steering.turn_bias_step must be > 0 (got {})",
                s.turn_bias_step
            )));
        }
        if !(s.turn_bias_ceiling.is_finite() && s.turn_bias_ceiling >= s.base_turn_bias) {
            return Err(TuningError::Invalid(format!(
                "steering.turn_bias_ceiling must be >= base_turn_bias (got {})",
                s.turn_bias_ceiling
            )));
        }
        if !(self.maneuver.grab_distance_cm.is_finite() && self.maneuver.grab_distance_cm > 0.0) {
            return Err(TuningError::Invalid(format!(
                "maneuver.grab_distance_cm must be > 0 (got {})",
                self.maneuver.grab_distance_cm
            )));
        }
        if self.link.sample_timeout_ms == 0 {
            return Err(TuningError::Invalid(
                "link.sample_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Line-correction constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringTuning {
    /// Turn bias on the line and after every reset
    pub base_turn_bias: f64,
    /// Increment per off-line tick on a marker color
    pub turn_bias_step: f64,
    /// Above this, the bias is reset when the neutral color is seen
    pub turn_bias_ceiling: f64,
}

impl Default for SteeringTuning {
    fn default() -> Self {
        Self {
            base_turn_bias: 3.0,
            turn_bias_step: 0.6,
            turn_bias_ceiling: 9.0,
        }
    }
}

/// Pickup maneuver constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManeuverTuning {
    /// Ultrasonic distance below which the object is grabbed (cm)
    pub grab_distance_cm: f32,
    /// Gripper run time when closing
    pub gripper_close_ms: u64,
    /// Rotation time toward the next path entry
    pub rotate_ms: u64,
    /// Speed offset added to the rotating motor
    pub rotate_speed_offset: i32,
}

impl ManeuverTuning {
    pub fn gripper_close(&self) -> Duration {
        Duration::from_millis(self.gripper_close_ms)
    }

    pub fn rotate(&self) -> Duration {
        Duration::from_millis(self.rotate_ms)
    }
}

impl Default for ManeuverTuning {
    fn default() -> Self {
        Self {
            grab_distance_cm: 5.0,
            gripper_close_ms: 500,
            rotate_ms: 4000,
            rotate_speed_offset: 5,
        }
    }
}

/// Run start constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartTuning {
    /// Speed of the right-motor nudge issued by `start()`
    pub nudge_speed: i32,
}

impl Default for StartTuning {
    fn default() -> Self {
        Self { nudge_speed: 1 }
    }
}

/// Link supervision constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkTuning {
    /// Receive timeout of the control loop; a timeout is a sensor gap
    pub sample_timeout_ms: u64,
    /// Silence after which the link is reported as timed out
    pub link_timeout_ms: u64,
}

impl LinkTuning {
    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(self.sample_timeout_ms)
    }

    pub fn link_timeout(&self) -> Duration {
        Duration::from_millis(self.link_timeout_ms)
    }
}

impl Default for LinkTuning {
    fn default() -> Self {
        Self {
            sample_timeout_ms: 100,
            link_timeout_ms: 10_000,
        }
    }
}
