//! Polarity discovery
//!
//! The first marker color seen after `start()` fixes the steering handedness
//! for the rest of the run: Yellow means Positive, Red means Negative.

use crate::state::{Polarity, Status, VehicleState};
use agv_protocol::{LineColor, SensorSample};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct PolarityResolver;

impl PolarityResolver {
    /// Resolve polarity from `sample` if the run is started and it is unknown
    ///
    /// On resolution the status moves to `MovingToPickup`. Returns the newly
    /// resolved polarity, if any.
    pub fn resolve(&self, state: &mut VehicleState, sample: &SensorSample) -> Option<Polarity> {
        if !state.started || state.polarity.is_known() {
            return None;
        }

        let polarity = match sample.line_color {
            LineColor::Yellow => Polarity::Positive,
            LineColor::Red => Polarity::Negative,
            _ => return None,
        };

        info!("Polarity resolved: {:?} (from {})", polarity, sample.line_color);
        state.polarity = polarity;
        state.set_status(Status::MovingToPickup);
        Some(polarity)
    }
}
