use serde_derive::{Deserialize, Serialize};
use std::fmt;

use crate::bbox::{BBox, Ltrb};

/// Identity the upstream tracker assigns to one physical object.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One detector output for one frame. The frame timestamp lives on the
/// enclosing [`crate::Frame`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Observation {
    #[serde(rename = "id")]
    pub track_id: TrackId,
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "c")]
    pub class: i32,
}

impl Observation {
    #[inline]
    pub fn new(track_id: u32, bbox: BBox<Ltrb>, class: i32) -> Self {
        Self {
            track_id: TrackId(track_id),
            bbox,
            class,
        }
    }
}
