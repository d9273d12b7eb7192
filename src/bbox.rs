use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug + Copy + PartialEq {}

/// Left-top-right-bottom format, contains left top and right bottom corners.
/// This is what the upstream detector hands out as `(x1, y1, x2, y2)`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// Serialized as a bare `[f32; 4]`, the format tag only exists at the type level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [f32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> From<[f32; 4]> for BBox<F> {
    fn from(slice: [f32; 4]) -> Self {
        BBox(slice, Default::default())
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        BBox([x1, y1, x2, y2], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(
            (self.left() + self.right()) / 2.0,
            (self.top() + self.bottom()) / 2.0,
        )
    }

    /// A box is usable when all corners are finite and the corners are ordered.
    /// Degenerate (zero area) boxes still have a well defined center and are kept.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.is_finite() && self.right() >= self.left() && self.bottom() >= self.top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_midpoint_of_corners() {
        let b = BBox::ltrb(480.0, 280.0, 520.0, 320.0);
        let c = b.center();
        assert_eq!(c, na::Point2::new(500.0, 300.0));
    }

    #[test]
    fn malformed_boxes_are_rejected() {
        assert!(BBox::ltrb(0.0, 0.0, 10.0, 10.0).is_well_formed());
        assert!(BBox::ltrb(5.0, 5.0, 5.0, 5.0).is_well_formed());
        assert!(!BBox::ltrb(10.0, 0.0, 0.0, 10.0).is_well_formed());
        assert!(!BBox::ltrb(0.0, 10.0, 10.0, 0.0).is_well_formed());
        assert!(!BBox::ltrb(f32::NAN, 0.0, 10.0, 10.0).is_well_formed());
    }
}
