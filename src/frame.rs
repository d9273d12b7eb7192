use crate::observation::Observation;

/// One video frame's worth of detector output.
pub struct Frame {
    pub dims: (u32, u32),
    pub observations: Vec<Observation>,
    pub timestamp: f64, // in seconds
}

impl Frame {
    #[inline]
    pub fn new(dims: (u32, u32), timestamp: f64, observations: Vec<Observation>) -> Self {
        Self {
            dims,
            observations,
            timestamp,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.dims.0
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.dims.1
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }
}
