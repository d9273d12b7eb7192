use nalgebra as na;
use std::collections::hash_map::{self, HashMap};

use crate::bbox::{BBox, Ltrb};
use crate::observation::{Observation, TrackId};
use crate::speed::SpeedSample;
use crate::track::TrackState;

/// All per-track state, keyed by the detector's track id.
///
/// Entries live for the whole session; nothing is evicted.
#[derive(Debug, Default)]
pub struct TrackStore {
    tracks: HashMap<TrackId, TrackState>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self {
            tracks: HashMap::with_capacity(64),
        }
    }

    /// Returns the state for `obs.track_id`, seeding it from `obs` when the id
    /// is seen for the first time. The flag tells whether seeding happened.
    pub fn get_or_create(&mut self, obs: &Observation, timestamp: f64) -> (&mut TrackState, bool) {
        match self.tracks.entry(obs.track_id) {
            hash_map::Entry::Occupied(e) => (e.into_mut(), false),
            hash_map::Entry::Vacant(e) => (
                e.insert(TrackState::new(obs.track_id, obs.class, obs.bbox, timestamp)),
                true,
            ),
        }
    }

    pub fn update(
        &mut self,
        id: TrackId,
        center: na::Point2<f32>,
        bbox: BBox<Ltrb>,
        timestamp: f64,
        sample: SpeedSample,
    ) -> Option<&TrackState> {
        let state = self.tracks.get_mut(&id)?;
        state.apply(center, bbox, timestamp, sample);

        Some(state)
    }

    pub fn mark_captured(&mut self, id: TrackId) {
        if let Some(state) = self.tracks.get_mut(&id) {
            state.capture_taken = true;
            state.capture_finalized = true;
        }
    }

    /// Bumps the failed-write counter and returns the new count.
    pub fn record_failed_attempt(&mut self, id: TrackId) -> u32 {
        match self.tracks.get_mut(&id) {
            Some(state) => {
                state.capture_attempts += 1;
                state.capture_attempts
            }
            None => 0,
        }
    }

    #[inline]
    pub fn get(&self, id: TrackId) -> Option<&TrackState> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TrackState> {
        self.tracks.values()
    }
}
