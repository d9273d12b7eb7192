use serde_derive::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::calibration::CalibrationConfig;
use crate::error::Error;
use crate::zone::ZoneConfig;

/// How elapsed time between two sightings of a track is measured.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeBase {
    /// Difference of frame timestamps.
    Timestamps,
    /// Constant-rate source, every sighting is one frame interval apart.
    FixedFps { fps: f32 },
}

/// What happens to a track whose evidence could not be written.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureFailurePolicy {
    /// Keep the track armed until `max_attempts` writes have failed.
    Retry { max_attempts: u32 },
    /// Consider the track captured even though nothing was written.
    MarkCaptured,
}

impl Default for CaptureFailurePolicy {
    fn default() -> Self {
        CaptureFailurePolicy::Retry { max_attempts: 3 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub calibration: CalibrationConfig,
    pub zone: ZoneConfig,
    pub speed_limit_kph: f32,
    pub allowed_classes: BTreeSet<i32>,
    pub class_names: BTreeMap<i32, String>,
    pub require_rightward_direction: bool,
    /// Classes captured on their first tracked update regardless of speed and zone.
    pub always_capture_classes: BTreeSet<i32>,
    /// Deployment specific correction applied to every estimate.
    pub speed_correction_factor: f32,
    pub time_base: TimeBase,
    pub capture_failure_policy: CaptureFailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        let class_names = [
            (0, "person"),
            (1, "bicycle"),
            (2, "car"),
            (3, "motorcycle"),
            (5, "bus"),
            (7, "truck"),
        ];

        Self {
            calibration: CalibrationConfig::default(),
            zone: ZoneConfig::default(),
            speed_limit_kph: 3.0,
            allowed_classes: class_names.iter().map(|(id, _)| *id).collect(),
            class_names: class_names
                .iter()
                .map(|(id, name)| (*id, name.to_string()))
                .collect(),
            require_rightward_direction: false,
            always_capture_classes: BTreeSet::new(),
            speed_correction_factor: 1.0,
            time_base: TimeBase::Timestamps,
            capture_failure_policy: CaptureFailurePolicy::default(),
        }
    }
}

impl Config {
    /// Keys missing from the file keep their default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.speed_limit_kph >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "speed_limit_kph must be non-negative, got {}",
                self.speed_limit_kph
            )));
        }

        if !(self.speed_correction_factor > 0.0) || !self.speed_correction_factor.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "speed_correction_factor must be positive, got {}",
                self.speed_correction_factor
            )));
        }

        if let TimeBase::FixedFps { fps } = self.time_base {
            if !(fps > 0.0) {
                return Err(Error::InvalidConfig(format!("fps must be positive, got {}", fps)));
            }
        }

        if let CaptureFailurePolicy::Retry { max_attempts: 0 } = self.capture_failure_policy {
            return Err(Error::InvalidConfig("max_attempts must be at least 1".into()));
        }

        Ok(())
    }

    pub fn class_name(&self, class: i32) -> String {
        self.class_names
            .get(&class)
            .cloned()
            .unwrap_or_else(|| format!("class{}", class))
    }

    /// Only `allowed_classes` decides whether a class is tracked at all;
    /// `always_capture_classes` relaxes the capture predicate of tracked ones.
    #[inline]
    pub fn is_allowed(&self, class: i32) -> bool {
        self.allowed_classes.contains(&class)
    }
}
