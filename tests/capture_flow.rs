use std::collections::BTreeSet;

use approx::assert_relative_eq;
use speedtrap::bbox::BBox;
use speedtrap::sink::CaptureRecord;
use speedtrap::zone::ZoneConfig;
use speedtrap::{
    Config, Direction, Error, EvidenceSink, FsEvidenceSink, Frame, Observation, Outcome, SpeedTrap,
    TrackId, TrackPhase,
};

#[derive(Default)]
struct RecordingSink {
    images: Vec<String>,
    records: Vec<CaptureRecord>,
}

impl EvidenceSink for RecordingSink {
    type Image = ();

    fn persist_image(&mut self, _: &(), request: &speedtrap::CaptureRequest<'_>) -> Result<String, Error> {
        let name = format!("{}_{}_{}", request.class_name, request.track_id, request.timestamp);
        self.images.push(name.clone());
        Ok(name)
    }

    fn append_record(&mut self, record: &CaptureRecord) -> Result<(), Error> {
        self.records.push(record.clone());
        Ok(())
    }
}

fn car(id: u32, cx: f32, cy: f32) -> Observation {
    Observation::new(id, BBox::ltrb(cx - 40.0, cy - 20.0, cx + 40.0, cy + 20.0), 2)
}

/// Cars only, 100 px per meter, 10 km/h limit. On a 1800x600 frame the zone
/// band is y in [250, 350] and the center band is x in [850, 950].
fn config() -> Config {
    Config {
        speed_limit_kph: 10.0,
        allowed_classes: BTreeSet::from([2]),
        zone: ZoneConfig {
            zone_offset_m: 0.0,
            zone_height_m: 1.0,
            center_tolerance_m: 0.5,
        },
        ..Default::default()
    }
}

#[test]
fn speeding_car_is_captured_exactly_once() {
    let mut trap = SpeedTrap::new(config(), RecordingSink::default()).unwrap();
    let dims = (1800, 600);

    let report = trap.process(&Frame::new(dims, 0.0, vec![car(7, 500.0, 300.0)]), &());
    assert!(matches!(report.outcomes[0], Outcome::Seeded { .. }));

    let report = trap.process(&Frame::new(dims, 1.0, vec![car(7, 560.0, 300.0)]), &());
    match &report.outcomes[0] {
        Outcome::Updated { sample, .. } => {
            assert_relative_eq!(sample.kph, 2.16, epsilon = 1e-4);
            assert_eq!(sample.direction, Direction::Right);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(trap.scene().track(TrackId(7)).unwrap().phase(), TrackPhase::Tracking);

    let report = trap.process(&Frame::new(dims, 2.0, vec![car(7, 900.0, 300.0)]), &());
    let record = report.captures().next().expect("capture expected");
    assert_eq!(record.speed_kph, 12.24);
    assert_eq!(record.timestamp, 2);
    assert_eq!(record.track_id, TrackId(7));
    assert_eq!(record.class_name, "car");
    assert_eq!(record.direction, Some(Direction::Right));

    // keeps speeding through the zone, nothing more is written
    for (i, x) in [940.0, 860.0, 940.0].iter().enumerate() {
        let t = 2.1 + i as f64 * 0.1;
        let report = trap.process(&Frame::new(dims, t, vec![car(7, *x, 300.0)]), &());
        assert_eq!(report.captures().count(), 0);
    }

    let state = trap.scene().track(TrackId(7)).unwrap();
    assert!(state.capture_taken && state.capture_finalized);
    assert_eq!(state.phase(), TrackPhase::Captured);
    assert_relative_eq!(state.speed_history[0], 2.16, epsilon = 1e-4);
    assert_relative_eq!(state.speed_history[1], 12.24, epsilon = 1e-4);
    assert_eq!(state.speed_history.len(), 5);

    let sink = trap.into_sink();
    assert_eq!(sink.images.len(), 1);
    assert_eq!(sink.records.len(), 1);
}

#[test]
fn tracks_in_one_frame_are_independent() {
    let mut trap = SpeedTrap::new(config(), RecordingSink::default()).unwrap();
    let dims = (1800, 600);

    trap.process(
        &Frame::new(dims, 0.0, vec![car(1, 500.0, 300.0), car(2, 1300.0, 300.0), car(3, 900.0, 300.0)]),
        &(),
    );
    let report = trap.process(
        &Frame::new(dims, 1.0, vec![car(1, 900.0, 300.0), car(2, 910.0, 300.0), car(3, 901.0, 300.0)]),
        &(),
    );

    let captured: Vec<_> = report.captures().map(|r| r.track_id).collect();
    assert_eq!(captured, vec![TrackId(1), TrackId(2)]);
    assert!(matches!(report.outcomes[2], Outcome::Updated { .. }));
    assert_eq!(trap.scene().store().len(), 3);
}

#[test]
fn recalibration_between_frames_applies_next_frame() {
    let mut trap = SpeedTrap::new(config(), RecordingSink::default()).unwrap();
    let dims = (1800, 600);

    trap.process(&Frame::new(dims, 0.0, vec![car(1, 0.0, 300.0)]), &());

    let mut cfg = config();
    cfg.calibration.pixels_per_meter = 200.0;
    trap.set_config(cfg).unwrap();

    let report = trap.process(&Frame::new(dims, 1.0, vec![car(1, 200.0, 300.0)]), &());
    assert_eq!(report.scale.pixels_per_meter, 200.0);
    assert_relative_eq!(report.outcomes[0].sample().unwrap().kph, 3.6, epsilon = 1e-4);

    let bad = Config {
        speed_correction_factor: -1.0,
        ..config()
    };
    assert!(trap.set_config(bad).is_err());
    assert_eq!(trap.config().calibration.pixels_per_meter, 200.0);
}

#[test]
fn filesystem_sink_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("speed_log.csv");
    let sink = FsEvidenceSink::create(dir.path().join("screenshots"), &log).unwrap();
    let mut trap = SpeedTrap::new(config(), sink).unwrap();

    let image = image::RgbImage::new(1800, 600);
    let dims = (1800, 600);
    trap.process(&Frame::new(dims, 1_700_000_000.0, vec![car(7, 500.0, 300.0)]), &image);
    let report = trap.process(&Frame::new(dims, 1_700_000_001.0, vec![car(7, 900.0, 300.0)]), &image);

    let record = report.captures().next().expect("capture expected");
    assert!(std::path::Path::new(&record.artifact).exists());
    drop(trap);

    let contents = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("1700000001,7,car,14.4,"));
    assert!(lines[1].ends_with("car_id7_speed14_1700000001.jpg,right"));
}
