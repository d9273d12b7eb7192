//! Evidence persistence.
//!
//! The capture logic only talks to [`EvidenceSink`]. [`FsEvidenceSink`] is the
//! stock implementation: one JPEG per capture plus one CSV row in an
//! append-only log.

use image::{codecs::jpeg::JpegEncoder, ColorType, Rgb, RgbImage};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::bbox::{BBox, Ltrb};
use crate::error::Error;
use crate::observation::TrackId;
use crate::speed::Direction;

pub const CSV_HEADER: [&str; 5] = ["timestamp", "object_id", "class", "speed_kph", "screenshot_path"];

/// Everything a sink needs to know to store the image of one capture.
#[derive(Debug, Clone, Copy)]
pub struct CaptureRequest<'a> {
    pub track_id: TrackId,
    pub class_name: &'a str,
    pub bbox: BBox<Ltrb>,
    pub speed_kph: f32,
    /// Whole seconds.
    pub timestamp: u64,
}

/// One row of the capture log. Field order is fixed for downstream readers.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    pub timestamp: u64,
    pub track_id: TrackId,
    pub class_name: String,
    /// Rounded to two decimals.
    pub speed_kph: f64,
    pub artifact: String,
    pub direction: Option<Direction>,
}

impl CaptureRecord {
    pub fn fields(&self, with_direction: bool) -> Vec<String> {
        let mut row = vec![
            self.timestamp.to_string(),
            self.track_id.to_string(),
            self.class_name.clone(),
            self.speed_kph.to_string(),
            self.artifact.clone(),
        ];

        if with_direction {
            if let Some(direction) = self.direction {
                row.push(direction.to_string());
            }
        }

        row
    }
}

#[inline]
pub fn round_kph(kph: f32) -> f64 {
    (kph as f64 * 100.0).round() / 100.0
}

pub trait EvidenceSink {
    /// Frame buffer type the sink knows how to encode.
    type Image: ?Sized;

    /// Stores the frame and returns a reference usable as a log field.
    fn persist_image(&mut self, image: &Self::Image, request: &CaptureRequest<'_>) -> Result<String, Error>;

    fn append_record(&mut self, record: &CaptureRecord) -> Result<(), Error>;
}

/// Append-only CSV log.
///
/// Every row is serialized on its own and handed to the writer in a single
/// `write_all`, so a row that failed to land is never replayed by a later
/// append.
pub struct CaptureLog<W: Write> {
    out: W,
    with_direction: bool,
}

impl<W: Write> CaptureLog<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            with_direction: true,
        }
    }

    pub fn write_header(&mut self) -> Result<(), Error> {
        self.write_row(CSV_HEADER)
    }

    pub fn append(&mut self, record: &CaptureRecord) -> Result<(), Error> {
        self.write_row(record.fields(self.with_direction))
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_row<I, T>(&mut self, row: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut line = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(Vec::with_capacity(128));
        line.write_record(row)?;
        let line = line.into_inner().map_err(|err| err.into_error())?;

        self.out.write_all(&line)?;
        self.out.flush()?;

        Ok(())
    }
}

pub struct FsEvidenceSink {
    screenshot_dir: PathBuf,
    log: CaptureLog<File>,
    jpeg_quality: u8,
    outline_box: bool,
}

impl FsEvidenceSink {
    /// Creates the screenshot directory and the log file (with header) when
    /// they do not exist yet. An existing log is appended to.
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(screenshot_dir: P, log_path: Q) -> Result<Self, Error> {
        let screenshot_dir = screenshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&screenshot_dir)?;

        let log_path = log_path.as_ref();
        let needs_header = fs::metadata(log_path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(log_path)?;
        let mut log = CaptureLog::new(file);

        if needs_header {
            debug!(path = %log_path.display(), "writing capture log header");
            log.write_header()?;
        }

        Ok(Self {
            screenshot_dir,
            log,
            jpeg_quality: 90,
            outline_box: true,
        })
    }

    pub fn with_direction(mut self, with_direction: bool) -> Self {
        self.log.with_direction = with_direction;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_box_outline(mut self, outline_box: bool) -> Self {
        self.outline_box = outline_box;
        self
    }

    pub fn file_name(request: &CaptureRequest<'_>) -> String {
        format!(
            "{}_id{}_speed{}_{}.jpg",
            request.class_name,
            request.track_id,
            request.speed_kph.max(0.0) as u32,
            request.timestamp
        )
    }

    fn encode(&self, image: &RgbImage, bbox: &BBox<Ltrb>) -> Result<Vec<u8>, Error> {
        let (w, h) = image.dimensions();
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);

        if self.outline_box {
            let mut annotated = image.clone();
            draw_outline(&mut annotated, bbox, Rgb([255, 0, 0]));
            encoder.encode(annotated.as_raw(), w, h, ColorType::Rgb8)?;
        } else {
            encoder.encode(image.as_raw(), w, h, ColorType::Rgb8)?;
        }

        Ok(buf)
    }
}

impl EvidenceSink for FsEvidenceSink {
    type Image = RgbImage;

    /// The JPEG is encoded in memory and written under a temporary name, so a
    /// failed capture leaves nothing behind in the screenshot directory.
    fn persist_image(&mut self, image: &RgbImage, request: &CaptureRequest<'_>) -> Result<String, Error> {
        let jpeg = self.encode(image, &request.bbox)?;

        let path = self.screenshot_dir.join(Self::file_name(request));
        let partial = path.with_extension("jpg.part");

        if let Err(err) = fs::write(&partial, &jpeg).and_then(|_| fs::rename(&partial, &path)) {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }

        Ok(path.to_string_lossy().into_owned())
    }

    fn append_record(&mut self, record: &CaptureRecord) -> Result<(), Error> {
        self.log.append(record)
    }
}

fn draw_outline(image: &mut RgbImage, bbox: &BBox<Ltrb>, color: Rgb<u8>) {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || !bbox.is_finite() {
        return;
    }

    let clip_x = |v: f32| (v.max(0.0) as u32).min(w - 1);
    let clip_y = |v: f32| (v.max(0.0) as u32).min(h - 1);

    let (l, r) = (clip_x(bbox.left()), clip_x(bbox.right()));
    let (t, b) = (clip_y(bbox.top()), clip_y(bbox.bottom()));

    for x in l..=r {
        image.put_pixel(x, t, color);
        image.put_pixel(x, b, color);
    }

    for y in t..=b {
        image.put_pixel(l, y, color);
        image.put_pixel(r, y, color);
    }
}
