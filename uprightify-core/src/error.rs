/// Errors surfaced by the orientation pipeline.
///
/// None of these are retried internally; the caller decides whether to skip,
/// log, or abort a batch.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrientError {
    #[error("pixel ({x}, {y}) is outside a {width}x{height} buffer")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OrientError>;
