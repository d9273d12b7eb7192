pub mod bbox;
pub mod calibration;
pub mod config;
pub mod error;
pub mod frame;
pub mod observation;
pub mod scene;
pub mod sink;
pub mod speed;
pub mod store;
pub mod track;
pub mod zone;

pub use config::Config;
pub use error::Error;
pub use frame::Frame;
pub use observation::{Observation, TrackId};
pub use scene::{FrameReport, Outcome, Scene};
pub use sink::{CaptureLog, CaptureRecord, CaptureRequest, EvidenceSink, FsEvidenceSink};
pub use speed::{Direction, SpeedSample};
pub use track::{TrackPhase, TrackState};

/// Drives one observation stream: a scene, the configuration snapshot it is
/// evaluated against and the sink receiving evidence.
///
/// The configuration can be swapped between frames (live recalibration); it is
/// validated on every swap, not on every frame.
pub struct SpeedTrap<S: EvidenceSink> {
    scene: Scene,
    config: Config,
    sink: S,
}

impl<S: EvidenceSink> SpeedTrap<S> {
    pub fn new(config: Config, sink: S) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            scene: Scene::new(),
            config,
            sink,
        })
    }

    #[inline]
    pub fn process(&mut self, frame: &Frame, image: &S::Image) -> FrameReport {
        self.scene.update(frame, image, &self.config, &mut self.sink)
    }

    pub fn set_config(&mut self, config: Config) -> Result<(), Error> {
        config.validate()?;
        self.config = config;

        Ok(())
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
