use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Displacements below this many pixels are detector jitter, not motion.
pub const JITTER_THRESHOLD_PX: f32 = 3.0;

const MPS_TO_KPH: f32 = 3.6;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::None => "none",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub kph: f32,
    pub direction: Direction,
}

impl SpeedSample {
    pub const STILL: SpeedSample = SpeedSample {
        kph: 0.0,
        direction: Direction::None,
    };

    #[inline]
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            kph: self.kph * factor,
            ..self
        }
    }
}

/// Speed between two consecutive centers of the same track.
///
/// Only the sign of the horizontal displacement decides the direction,
/// vertical motion contributes to the speed but never to the direction.
pub fn estimate(
    prev: na::Point2<f32>,
    curr: na::Point2<f32>,
    elapsed_seconds: f32,
    effective_ppm: f32,
) -> SpeedSample {
    let dx = curr.x - prev.x;
    let dy = curr.y - prev.y;
    let pixel_distance = dx.hypot(dy);

    if !(pixel_distance >= JITTER_THRESHOLD_PX) {
        return SpeedSample::STILL;
    }

    if !(elapsed_seconds > 0.0) || !(effective_ppm > 0.0) || !effective_ppm.is_finite() {
        return SpeedSample::STILL;
    }

    let meters = pixel_distance / effective_ppm;
    let mps = meters / elapsed_seconds;

    SpeedSample {
        kph: mps * MPS_TO_KPH,
        direction: if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        },
    }
}
