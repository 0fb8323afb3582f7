//! Rounding of scalar inputs (occupant counts, outdoor-air volumes) before
//! they feed load calculations. Final Watt figures are never rounded here.

use hl_core::{Real, round_half_up};
use hl_project::{RoundingMode, RoundingSettings};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Digits kept when cleaning binary noise off a quotient before rounding,
/// so that e.g. 1.1 / 0.1 is treated as 11 rather than 11.000000000000002.
const SNAP_DIGITS: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    pub occupancy: RoundingMode,
    pub outdoor_air: RoundingMode,
    /// Outdoor-air quantum [m³/h].
    pub outdoor_air_step: Real,
}

impl RoundingPolicy {
    pub fn new(settings: &RoundingSettings) -> Result<Self, ConfigError> {
        let step = settings.outdoor_air.step;
        if !step.is_finite() || step <= 0.0 {
            return Err(ConfigError::InvalidRounding {
                setting: "outdoor_air.step",
                value: step,
                reason: "must be positive and finite",
            });
        }
        Ok(Self {
            occupancy: settings.occupancy.mode,
            outdoor_air: settings.outdoor_air.mode,
            outdoor_air_step: step,
        })
    }

    /// Whole number of occupants. Non-finite input saturates (NaN gives 0).
    pub fn round_occupancy(&self, count: Real) -> i64 {
        round_by_mode(round_half_up(count, SNAP_DIGITS), self.occupancy) as i64
    }

    /// Outdoor-air volume quantized to the configured step [m³/h].
    pub fn round_outdoor_air(&self, volume_m3h: Real) -> Real {
        let step = self.outdoor_air_step;
        let quanta = round_by_mode(round_half_up(volume_m3h / step, SNAP_DIGITS), self.outdoor_air);
        round_half_up(quanta * step, SNAP_DIGITS)
    }
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            occupancy: RoundingMode::Nearest,
            outdoor_air: RoundingMode::Nearest,
            outdoor_air_step: 1.0,
        }
    }
}

/// Round to an integer: halves away from zero, or always up.
pub fn round_by_mode(value: Real, mode: RoundingMode) -> Real {
    match mode {
        RoundingMode::Nearest => round_half_up(value, 0),
        RoundingMode::Ceiling => value.ceil(),
    }
}
