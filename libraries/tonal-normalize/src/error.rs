//! Error types for analysis and normalization

use thiserror::Error;
use tonal_loudness::LoudnessError;
use tonal_media::MediaError;

/// Result type for normalization operations
pub type Result<T> = std::result::Result<T, NormalizeError>;

#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Demux, decode, filter, encode or mux failure
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Meter or limiter rejected its parameters
    #[error("Loudness processing failed: {0}")]
    Loudness(#[from] LoudnessError),

    /// Target configuration out of range
    #[error("Invalid normalization target: {0}")]
    InvalidTarget(String),

    /// Offset is not a finite number of seconds
    #[error("Invalid offset: {0} seconds")]
    InvalidOffset(f64),
}

impl NormalizeError {
    /// The underlying media failure, if this is one
    pub fn as_media(&self) -> Option<&MediaError> {
        match self {
            Self::Media(e) => Some(e),
            _ => None,
        }
    }
}
