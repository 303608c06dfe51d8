//! Sensor readings
//!
//! The color sensor reports an EV3 color code; the controller only cares about
//! five classes of it (see [`LineColor`]). The ultrasonic sensor reports a
//! distance in centimeters.

use crate::ProtocolError;
use num_enum::TryFromPrimitive;
use std::fmt;

/// EV3 color-sensor code ("color" mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum ColorCode {
    /// No color detected
    None = 0,
    Black = 1,
    Blue = 2,
    Green = 3,
    Yellow = 4,
    Red = 5,
    White = 6,
    Brown = 7,
}

impl TryFrom<i32> for ColorCode {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(|code| ColorCode::try_from_primitive(code).ok())
            .ok_or(ProtocolError::InvalidColorCode { code: value })
    }
}

/// Line color class the controller reacts to
///
/// - `Black`: primary line color (EV3 black *and* brown)
/// - `Yellow` / `Red`: marker colors, used for polarity discovery and steering
/// - `White`: neutral color, used as a maneuver trigger
/// - `Other`: anything else, including undecodable readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineColor {
    Black,
    Yellow,
    Red,
    White,
    #[default]
    Other,
}

impl LineColor {
    /// Classify a raw color-mode reading
    ///
    /// Readings that are not a valid EV3 code are classified as `Other`.
    pub fn from_raw(raw: i32) -> Self {
        match ColorCode::try_from(raw) {
            Ok(code) => code.into(),
            Err(_) => LineColor::Other,
        }
    }

    /// Whether this is one of the two marker colors
    pub fn is_marker(self) -> bool {
        matches!(self, LineColor::Yellow | LineColor::Red)
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            LineColor::Black => "Black",
            LineColor::Yellow => "Yellow",
            LineColor::Red => "Red",
            LineColor::White => "White",
            LineColor::Other => "Other",
        }
    }
}

impl From<ColorCode> for LineColor {
    fn from(code: ColorCode) -> Self {
        match code {
            ColorCode::Black | ColorCode::Brown => LineColor::Black,
            ColorCode::Yellow => LineColor::Yellow,
            ColorCode::Red => LineColor::Red,
            ColorCode::White => LineColor::White,
            ColorCode::None | ColorCode::Blue | ColorCode::Green => LineColor::Other,
        }
    }
}

impl fmt::Display for LineColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded sensor reading, delivered once per sensor-update tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSample {
    /// Classified line color
    pub line_color: LineColor,
    /// Raw color-mode value as reported by the sensor
    pub line_raw: i32,
    /// Ultrasonic distance (cm)
    pub distance_cm: f32,
}

impl SensorSample {
    /// Build a sample from raw sensor values
    pub fn from_raw(line_raw: i32, distance_cm: f32) -> Self {
        Self {
            line_color: LineColor::from_raw(line_raw),
            line_raw,
            distance_cm,
        }
    }

    /// Build a sample from an already-classified color
    ///
    /// The raw value is the canonical EV3 code of the class (0 for `Other`).
    pub fn new(line_color: LineColor, distance_cm: f32) -> Self {
        let line_raw = match line_color {
            LineColor::Black => ColorCode::Black as i32,
            LineColor::Yellow => ColorCode::Yellow as i32,
            LineColor::Red => ColorCode::Red as i32,
            LineColor::White => ColorCode::White as i32,
            LineColor::Other => ColorCode::None as i32,
        };
        Self {
            line_color,
            line_raw,
            distance_cm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_code_from_i32() {
        assert_eq!(ColorCode::try_from(1_i32).unwrap(), ColorCode::Black);
        assert_eq!(ColorCode::try_from(7_i32).unwrap(), ColorCode::Brown);
        assert_eq!(
            ColorCode::try_from(8_i32),
            Err(ProtocolError::InvalidColorCode { code: 8 })
        );
        assert_eq!(
            ColorCode::try_from(-1_i32),
            Err(ProtocolError::InvalidColorCode { code: -1 })
        );
    }

    #[test]
    fn test_brown_counts_as_primary_line() {
        assert_eq!(LineColor::from_raw(1), LineColor::Black);
        assert_eq!(LineColor::from_raw(7), LineColor::Black);
    }

    #[test]
    fn test_line_color_classes() {
        assert_eq!(LineColor::from_raw(4), LineColor::Yellow);
        assert_eq!(LineColor::from_raw(5), LineColor::Red);
        assert_eq!(LineColor::from_raw(6), LineColor::White);
        for raw in [0, 2, 3, 9, 255, -3] {
            assert_eq!(LineColor::from_raw(raw), LineColor::Other, "raw {}", raw);
        }
    }

    #[test]
    fn test_marker_colors() {
        assert!(LineColor::Yellow.is_marker());
        assert!(LineColor::Red.is_marker());
        assert!(!LineColor::Black.is_marker());
        assert!(!LineColor::White.is_marker());
    }

    #[test]
    fn test_sample_construction() {
        let sample = SensorSample::from_raw(7, 12.5);
        assert_eq!(sample.line_color, LineColor::Black);
        assert_eq!(sample.line_raw, 7);
        assert_eq!(sample.distance_cm, 12.5);

        let sample = SensorSample::new(LineColor::White, 50.0);
        assert_eq!(sample.line_raw, 6);
        assert_eq!(LineColor::from_raw(sample.line_raw), LineColor::White);
    }
}
