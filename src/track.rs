use nalgebra as na;

use crate::bbox::{BBox, Ltrb};
use crate::observation::TrackId;
use crate::speed::{Direction, SpeedSample};

/// Lifecycle of a track as seen by the capture logic.
/// `Captured` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPhase {
    Seeded,
    Tracking,
    Captured,
}

#[derive(Debug, Clone)]
pub struct TrackState {
    pub id: TrackId,
    pub class: i32,
    pub last_center: na::Point2<f32>,
    pub last_box: BBox<Ltrb>,
    pub first_seen_time: f64,
    pub last_seen_time: f64,
    pub max_speed_kph: f32,
    pub speed_history: Vec<f32>,
    pub last_direction: Direction,
    pub updates: u32,
    pub capture_taken: bool,
    // set together with `capture_taken`; both are checked before capturing
    pub capture_finalized: bool,
    pub capture_attempts: u32,
}

impl TrackState {
    pub fn new(id: TrackId, class: i32, bbox: BBox<Ltrb>, timestamp: f64) -> Self {
        Self {
            id,
            class,
            last_center: bbox.center(),
            last_box: bbox,
            first_seen_time: timestamp,
            last_seen_time: timestamp,
            max_speed_kph: 0.0,
            speed_history: Vec::new(),
            last_direction: Direction::None,
            updates: 0,
            capture_taken: false,
            capture_finalized: false,
            capture_attempts: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> TrackPhase {
        if self.capture_taken || self.capture_finalized {
            TrackPhase::Captured
        } else if self.updates > 0 {
            TrackPhase::Tracking
        } else {
            TrackPhase::Seeded
        }
    }

    #[inline]
    pub fn can_capture(&self) -> bool {
        !self.capture_taken && !self.capture_finalized
    }

    /// Mean of the recorded samples, `None` until the first real motion.
    pub fn average_speed(&self) -> Option<f32> {
        if self.speed_history.is_empty() {
            return None;
        }

        Some(self.speed_history.iter().sum::<f32>() / self.speed_history.len() as f32)
    }

    pub(crate) fn apply(
        &mut self,
        center: na::Point2<f32>,
        bbox: BBox<Ltrb>,
        timestamp: f64,
        sample: SpeedSample,
    ) {
        self.last_center = center;
        self.last_box = bbox;
        self.last_seen_time = timestamp;
        self.updates += 1;

        // jitter and clock anomalies come back without a direction
        if sample.direction != Direction::None {
            self.speed_history.push(sample.kph);
            self.max_speed_kph = self.max_speed_kph.max(sample.kph);
            self.last_direction = sample.direction;
        }
    }
}
