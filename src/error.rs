use crate::observation::TrackId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image Error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Csv Error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Json Error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Evidence sink failed for track {track_id}: {source}")]
    SinkWriteFailure {
        track_id: TrackId,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn sink(track_id: TrackId, source: Error) -> Self {
        Error::SinkWriteFailure {
            track_id,
            source: Box::new(source),
        }
    }
}
