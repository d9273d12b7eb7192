use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Capture zone described in meters, relative to the frame center.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ZoneConfig {
    /// Downward shift of the band from the vertical frame center.
    pub zone_offset_m: f32,
    pub zone_height_m: f32,
    /// Half-width of the band around the horizontal frame center.
    pub center_tolerance_m: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            zone_offset_m: 0.5,
            zone_height_m: 1.0,
            center_tolerance_m: 0.5,
        }
    }
}

/// Pixel-space zone for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneGeometry {
    pub top_px: f32,
    pub bottom_px: f32,
    pub center_x_px: f32,
    pub center_y_px: f32,
    pub half_tolerance_px: f32,
}

impl ZoneGeometry {
    #[inline]
    pub fn in_zone(&self, p: na::Point2<f32>) -> bool {
        p.y >= self.top_px && p.y <= self.bottom_px
    }

    #[inline]
    pub fn in_center_band(&self, p: na::Point2<f32>) -> bool {
        (p.x - self.center_x_px).abs() <= self.half_tolerance_px
    }

    #[inline]
    pub fn contains(&self, p: na::Point2<f32>) -> bool {
        self.in_zone(p) && self.in_center_band(p)
    }
}

pub fn compute_zone(
    frame_width: u32,
    frame_height: u32,
    effective_ppm: f32,
    config: &ZoneConfig,
) -> ZoneGeometry {
    let fw = frame_width as f32;
    let fh = frame_height as f32;

    let height_px = config.zone_height_m * effective_ppm;
    let offset_px = config.zone_offset_m * effective_ppm;

    let top_raw = (fh - height_px) / 2.0 + offset_px;
    let top = top_raw.clamp(0.0, fh);
    let bottom = (top_raw + height_px).min(fh).max(top);

    ZoneGeometry {
        top_px: top,
        bottom_px: bottom,
        center_x_px: (fw / 2.0).clamp(0.0, fw),
        center_y_px: (top + bottom) / 2.0,
        half_tolerance_px: (effective_ppm * config.center_tolerance_m).round().max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_zone_sits_below_center() {
        let zone = compute_zone(1920, 1080, 100.0, &ZoneConfig::default());

        assert_eq!(zone.top_px, 540.0);
        assert_eq!(zone.bottom_px, 640.0);
        assert_eq!(zone.center_x_px, 960.0);
        assert_eq!(zone.center_y_px, 590.0);
        assert_eq!(zone.half_tolerance_px, 50.0);
    }

    #[test]
    fn zone_is_clipped_to_frame() {
        let cfg = ZoneConfig {
            zone_offset_m: 10.0,
            zone_height_m: 20.0,
            center_tolerance_m: 0.5,
        };
        let zone = compute_zone(640, 480, 100.0, &cfg);
        assert_eq!(zone.top_px, 240.0);
        assert_eq!(zone.bottom_px, 480.0);

        let cfg = ZoneConfig {
            zone_offset_m: -2.0,
            zone_height_m: 2.0,
            center_tolerance_m: 0.5,
        };
        let zone = compute_zone(640, 480, 100.0, &cfg);
        assert_eq!(zone.top_px, 0.0);
        assert_eq!(zone.bottom_px, 140.0);

        let cfg = ZoneConfig {
            zone_offset_m: -20.0,
            ..Default::default()
        };
        let zone = compute_zone(640, 480, 100.0, &cfg);
        assert_eq!((zone.top_px, zone.bottom_px), (0.0, 0.0));
    }

    #[test]
    fn tolerance_is_rounded() {
        let cfg = ZoneConfig {
            center_tolerance_m: 0.5,
            ..Default::default()
        };
        let zone = compute_zone(1920, 1080, 33.0, &cfg);
        assert_eq!(zone.half_tolerance_px, 17.0);
    }

    #[test]
    fn predicates() {
        let zone = compute_zone(1920, 1080, 100.0, &ZoneConfig::default());

        assert!(zone.contains(na::Point2::new(960.0, 590.0)));
        assert!(zone.contains(na::Point2::new(1010.0, 540.0)));
        assert!(!zone.in_center_band(na::Point2::new(1011.0, 590.0)));
        assert!(!zone.in_zone(na::Point2::new(960.0, 641.0)));
        assert!(zone.in_zone(na::Point2::new(0.0, 600.0)));
    }
}
