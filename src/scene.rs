use nalgebra as na;
use tracing::{debug, info, warn};

use crate::calibration::{self, Scale};
use crate::config::{CaptureFailurePolicy, Config, TimeBase};
use crate::error::Error;
use crate::frame::Frame;
use crate::observation::{Observation, TrackId};
use crate::sink::{round_kph, CaptureRecord, CaptureRequest, EvidenceSink};
use crate::speed::{self, Direction, SpeedSample};
use crate::store::TrackStore;
use crate::track::TrackState;
use crate::zone::{self, ZoneGeometry};

/// What happened to a single observation.
#[derive(Debug)]
pub enum Outcome {
    /// Filtered out: class not allowed or malformed box.
    Ignored { track_id: TrackId },
    /// First sighting, state created, no speed yet.
    Seeded { track_id: TrackId },
    Updated {
        track_id: TrackId,
        sample: SpeedSample,
    },
    Captured {
        track_id: TrackId,
        sample: SpeedSample,
        record: CaptureRecord,
    },
    /// The sink failed. `gave_up` tells whether the track was marked captured anyway.
    CaptureFailed {
        track_id: TrackId,
        sample: SpeedSample,
        error: Error,
        gave_up: bool,
    },
}

impl Outcome {
    pub fn track_id(&self) -> TrackId {
        match self {
            Outcome::Ignored { track_id }
            | Outcome::Seeded { track_id }
            | Outcome::Updated { track_id, .. }
            | Outcome::Captured { track_id, .. }
            | Outcome::CaptureFailed { track_id, .. } => *track_id,
        }
    }

    pub fn sample(&self) -> Option<SpeedSample> {
        match self {
            Outcome::Updated { sample, .. }
            | Outcome::Captured { sample, .. }
            | Outcome::CaptureFailed { sample, .. } => Some(*sample),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct FrameReport {
    pub scale: Scale,
    pub zone: ZoneGeometry,
    pub outcomes: Vec<Outcome>,
}

impl FrameReport {
    pub fn captures(&self) -> impl Iterator<Item = &CaptureRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Captured { record, .. } => Some(record),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &Error> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::CaptureFailed { error, .. } => Some(error),
            _ => None,
        })
    }
}

/// Per-frame geometry shared by every observation of that frame.
struct FrameContext<'a, I: ?Sized> {
    timestamp: f64,
    ppm: f32,
    zone: ZoneGeometry,
    image: &'a I,
}

/// Capture decision state machine.
///
/// Each track goes `Seeded -> Tracking -> Captured`; the last one is terminal,
/// so at most one piece of evidence is produced per track id.
#[derive(Debug, Default)]
pub struct Scene {
    store: TrackStore,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            store: TrackStore::new(),
        }
    }

    #[inline]
    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    #[inline]
    pub fn track(&self, id: TrackId) -> Option<&TrackState> {
        self.store.get(id)
    }

    /// Processes one frame worth of observations in the order they were delivered.
    /// Sink failures are reported in the returned outcomes and never stop the frame.
    pub fn update<S: EvidenceSink>(
        &mut self,
        frame: &Frame,
        image: &S::Image,
        config: &Config,
        sink: &mut S,
    ) -> FrameReport {
        let scale = calibration::resolve_detailed(&config.calibration, frame.width(), frame.height());
        let zone = zone::compute_zone(
            frame.width(),
            frame.height(),
            scale.pixels_per_meter,
            &config.zone,
        );

        let ctx = FrameContext {
            timestamp: frame.timestamp,
            ppm: scale.pixels_per_meter,
            zone,
            image,
        };

        let outcomes = frame
            .iter()
            .map(|obs| self.observe(obs, &ctx, config, sink))
            .collect();

        FrameReport {
            scale,
            zone,
            outcomes,
        }
    }

    fn observe<S: EvidenceSink>(
        &mut self,
        obs: &Observation,
        ctx: &FrameContext<'_, S::Image>,
        config: &Config,
        sink: &mut S,
    ) -> Outcome {
        let track_id = obs.track_id;

        if !config.is_allowed(obs.class) || !obs.bbox.is_well_formed() {
            return Outcome::Ignored { track_id };
        }

        let center = obs.bbox.center();
        let (state, is_new) = self.store.get_or_create(obs, ctx.timestamp);

        if is_new {
            debug!(track = %track_id, class = obs.class, x = center.x, y = center.y, "track seeded");
            return Outcome::Seeded { track_id };
        }

        let elapsed = match config.time_base {
            TimeBase::Timestamps => (ctx.timestamp - state.last_seen_time) as f32,
            TimeBase::FixedFps { fps } => 1.0 / fps,
        };

        let sample = speed::estimate(state.last_center, center, elapsed, ctx.ppm)
            .scaled(config.speed_correction_factor);

        let Some(state) = self.store.update(track_id, center, obs.bbox, ctx.timestamp, sample) else {
            return Outcome::Ignored { track_id };
        };

        if !wants_capture(state, obs.class, &sample, center, &ctx.zone, config) {
            return Outcome::Updated { track_id, sample };
        }

        self.capture(obs, sample, ctx, config, sink)
    }

    fn capture<S: EvidenceSink>(
        &mut self,
        obs: &Observation,
        sample: SpeedSample,
        ctx: &FrameContext<'_, S::Image>,
        config: &Config,
        sink: &mut S,
    ) -> Outcome {
        let track_id = obs.track_id;
        let class_name = config.class_name(obs.class);
        let timestamp = ctx.timestamp.max(0.0).floor() as u64;

        let request = CaptureRequest {
            track_id,
            class_name: &class_name,
            bbox: obs.bbox,
            speed_kph: sample.kph,
            timestamp,
        };

        let written = sink.persist_image(ctx.image, &request).and_then(|artifact| {
            let record = CaptureRecord {
                timestamp,
                track_id,
                class_name: class_name.clone(),
                speed_kph: round_kph(sample.kph),
                artifact,
                direction: (sample.direction != Direction::None).then_some(sample.direction),
            };

            sink.append_record(&record).map(|_| record)
        });

        match written {
            Ok(record) => {
                self.store.mark_captured(track_id);
                info!(
                    track = %track_id,
                    class = %class_name,
                    speed_kph = record.speed_kph,
                    artifact = %record.artifact,
                    "capture taken"
                );

                Outcome::Captured {
                    track_id,
                    sample,
                    record,
                }
            }
            Err(err) => {
                let attempts = self.store.record_failed_attempt(track_id);
                let gave_up = match config.capture_failure_policy {
                    CaptureFailurePolicy::MarkCaptured => true,
                    CaptureFailurePolicy::Retry { max_attempts } => attempts >= max_attempts,
                };

                if gave_up {
                    self.store.mark_captured(track_id);
                }

                warn!(track = %track_id, attempts, gave_up, error = %err, "capture failed");

                Outcome::CaptureFailed {
                    track_id,
                    sample,
                    error: Error::sink(track_id, err),
                    gave_up,
                }
            }
        }
    }
}

fn wants_capture(
    state: &TrackState,
    class: i32,
    sample: &SpeedSample,
    center: na::Point2<f32>,
    zone: &ZoneGeometry,
    config: &Config,
) -> bool {
    if !state.can_capture() {
        return false;
    }

    if config.always_capture_classes.contains(&class) {
        return true;
    }

    if config.require_rightward_direction && sample.direction != Direction::Right {
        return false;
    }

    sample.kph > config.speed_limit_kph && zone.contains(center)
}
