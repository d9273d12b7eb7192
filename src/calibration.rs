//! Pixel-to-meter scale resolution.
//!
//! The operator either types a raw pixels-per-meter value or drags two
//! vertical reference lines a known real-world distance apart. Both inputs are
//! tuned live, so half-adjusted states (lines on top of each other, a zero
//! distance) are expected and simply fall back to the manual value.

use serde_derive::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CalibrationConfig {
    pub pixels_per_meter: f32,
    pub use_line_calibration: bool,
    pub line1_x: f32,
    pub line2_x: f32,
    pub real_world_distance_m: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: 100.0,
            use_line_calibration: false,
            line1_x: 200.0,
            line2_x: 300.0,
            real_world_distance_m: 1.0,
        }
    }
}

/// Where the effective scale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSource {
    Lines,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub pixels_per_meter: f32,
    pub source: ScaleSource,
}

impl CalibrationConfig {
    /// Scale implied by the two reference lines, if they describe one.
    pub fn line_scale(&self) -> Option<f32> {
        let pixel_distance = (self.line2_x - self.line1_x).abs();

        if self.real_world_distance_m > 0.0 && pixel_distance > 0.0 {
            Some(pixel_distance / self.real_world_distance_m)
        } else {
            None
        }
    }
}

#[inline]
pub fn resolve(config: &CalibrationConfig, frame_width: u32, frame_height: u32) -> f32 {
    resolve_detailed(config, frame_width, frame_height).pixels_per_meter
}

/// Frame dimensions are accepted for interface stability; the current
/// calibration model is resolution independent.
pub fn resolve_detailed(config: &CalibrationConfig, _frame_width: u32, _frame_height: u32) -> Scale {
    if config.use_line_calibration {
        if let Some(ppm) = config.line_scale() {
            return Scale {
                pixels_per_meter: ppm,
                source: ScaleSource::Lines,
            };
        }

        debug!(
            line1_x = config.line1_x,
            line2_x = config.line2_x,
            distance_m = config.real_world_distance_m,
            "line calibration unusable, falling back to manual scale"
        );
    }

    Scale {
        pixels_per_meter: config.pixels_per_meter,
        source: ScaleSource::Manual,
    }
}
