//! Replays a detections dump through the speed trap.
//!
//! Each line of the dump is `<timestamp_ms>:<json array of observations>`,
//! e.g. `1000:[{"id": 7, "bbox": [480, 280, 520, 320], "c": 2}]`.
//!
//! usage: replay <dets file> [config.json] [output dir]

use speedtrap::{Config, Frame, FsEvidenceSink, Observation, Outcome, SpeedTrap};
use std::io::BufRead;
use tracing::{info, warn};

const FRAME_W: u32 = 1920;
const FRAME_H: u32 = 1080;

fn main() -> Result<(), speedtrap::Error> {
    tracing_subscriber::fmt()
        .with_env_filter("speedtrap=debug,replay=info")
        .init();

    let mut args = std::env::args().skip(1);
    let Some(in_file_name) = args.next() else {
        eprintln!("usage: replay <dets file> [config.json] [output dir]");
        std::process::exit(2);
    };

    let config = match args.next() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let out_dir = std::path::PathBuf::from(args.next().unwrap_or_else(|| ".".into()));

    let sink = FsEvidenceSink::create(out_dir.join("screenshots"), out_dir.join("speed_log.csv"))?;
    let mut trap = SpeedTrap::new(config, sink)?;

    // no video here, evidence shows the box on a blank canvas
    let canvas = image::RgbImage::new(FRAME_W, FRAME_H);

    let dets_file = std::fs::File::open(&in_file_name)?;
    let mut frames = 0usize;
    let mut captures = 0usize;

    for line in std::io::BufReader::new(dets_file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let Some((ts, vector)) = line.split_once(':') else {
            warn!("wrong file format: expected `:`");
            continue;
        };

        let (ts_ms, observations): (u64, Vec<Observation>) =
            match (ts.trim().parse::<u64>(), serde_json::from_str(vector)) {
                (Ok(ts), Ok(obs)) => (ts, obs),
                (Ok(_), Err(err)) => {
                    warn!(%err, "wrong file format: parse json failed");
                    continue;
                }
                (Err(err), _) => {
                    warn!(%err, "wrong file format: parse timestamp failed");
                    continue;
                }
            };

        let frame = Frame::new((FRAME_W, FRAME_H), ts_ms as f64 / 1000.0, observations);
        let report = trap.process(&frame, &canvas);
        frames += 1;

        for outcome in &report.outcomes {
            match outcome {
                Outcome::Captured { record, .. } => {
                    captures += 1;
                    info!(
                        "{} id {} | {:.1} km/h -> {}",
                        record.class_name, record.track_id, record.speed_kph, record.artifact
                    );
                }
                Outcome::CaptureFailed { error, .. } => warn!(%error, "capture lost"),
                _ => (),
            }
        }
    }

    for state in trap.scene().store().iter() {
        if let Some(avg) = state.average_speed() {
            info!(
                track = %state.id,
                max_kph = state.max_speed_kph,
                avg_kph = avg,
                captured = !state.can_capture(),
                "track summary"
            );
        }
    }

    info!(
        frames,
        captures,
        tracks = trap.scene().store().len(),
        "finished"
    );

    Ok(())
}
