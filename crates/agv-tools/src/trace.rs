//! # Sample traces
//!
//! A recorded (or hand-written) stream of sensor samples, replayed through
//! the controller by `agv-cli replay`.
//!
//! ```toml
//! name = "pickup, positive polarity"
//! auto_start = true
//!
//! [[samples]]
//! color = "yellow"
//! distance_cm = 40.0
//! delay_ms = 50
//!
//! [[samples]]
//! color = 1            # raw EV3 code
//! distance_cm = 40.0
//! ```

use agv_protocol::{ColorCode, SensorSample};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid trace file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize trace: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Sample {index}: unknown color name '{name}'")]
    UnknownColor { index: usize, name: String },
}

/// Color of a trace sample: a raw sensor code or an EV3 color name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Code(i32),
    Name(String),
}

impl ColorSpec {
    /// Raw sensor value, or `None` for an unknown name
    ///
    /// Raw codes are passed through unchanged, including invalid ones;
    /// classification is the controller's job.
    pub fn raw(&self) -> Option<i32> {
        match self {
            ColorSpec::Code(code) => Some(*code),
            ColorSpec::Name(name) => {
                let code = match name.to_ascii_lowercase().as_str() {
                    "none" => ColorCode::None,
                    "black" => ColorCode::Black,
                    "blue" => ColorCode::Blue,
                    "green" => ColorCode::Green,
                    "yellow" => ColorCode::Yellow,
                    "red" => ColorCode::Red,
                    "white" => ColorCode::White,
                    "brown" => ColorCode::Brown,
                    _ => return None,
                };
                Some(code as i32)
            },
        }
    }
}

impl From<i32> for ColorSpec {
    fn from(code: i32) -> Self {
        ColorSpec::Code(code)
    }
}

/// One trace entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    pub color: ColorSpec,
    pub distance_cm: f32,
    /// Pause before this sample is delivered
    #[serde(default)]
    pub delay_ms: u64,
}

impl TraceSample {
    pub fn new(color: impl Into<ColorSpec>, distance_cm: f32, delay_ms: u64) -> Self {
        Self {
            color: color.into(),
            distance_cm,
            delay_ms,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// A sample stream loaded from TOML
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issue `start()` before the first sample
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub samples: Vec<TraceSample>,
}

impl SampleTrace {
    pub fn from_toml_str(content: &str) -> Result<Self, TraceError> {
        let trace: SampleTrace = toml::from_str(content)?;
        // Surface bad color names at load time rather than mid-replay
        trace.sensor_samples()?;
        Ok(trace)
    }

    pub fn to_toml_string(&self) -> Result<String, TraceError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TraceError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Decoded samples paired with their delays
    pub fn sensor_samples(&self) -> Result<Vec<(Duration, SensorSample)>, TraceError> {
        self.samples
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let raw = entry.color.raw().ok_or_else(|| TraceError::UnknownColor {
                    index,
                    name: match &entry.color {
                        ColorSpec::Name(name) => name.clone(),
                        ColorSpec::Code(code) => code.to_string(),
                    },
                })?;
                Ok((entry.delay(), SensorSample::from_raw(raw, entry.distance_cm)))
            })
            .collect()
    }

    /// Total pacing delay of the trace
    pub fn duration(&self) -> Duration {
        self.samples.iter().map(TraceSample::delay).sum()
    }
}
