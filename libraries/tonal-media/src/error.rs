//! Error type for media operations

use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using `MediaError`
pub type Result<T> = std::result::Result<T, MediaError>;

/// A failed media operation.
///
/// Every failure coming out of the demuxer, decoder, filters, encoder or muxer
/// is reported through this one type. `operation` names what was attempted,
/// `detail` carries the underlying library's diagnostic text, and `path` is
/// set when the failure is tied to a specific file.
#[derive(Error, Debug)]
#[error("Failed to {operation} ({detail}){}", while_opening(.path))]
pub struct MediaError {
    operation: String,
    detail: String,
    path: Option<PathBuf>,
}

fn while_opening(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" (while opening: {})", p.display()))
        .unwrap_or_default()
}

impl MediaError {
    pub fn new(operation: impl Into<String>, detail: impl Display) -> Self {
        Self {
            operation: operation.into(),
            detail: detail.to_string(),
            path: None,
        }
    }

    /// Attach the file this failure is about
    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Maps any displayable library error into a [`MediaError`] for `operation`.
pub trait OrMedia<T> {
    fn or_media(self, operation: &str) -> Result<T>;
}

impl<T, E: Display> OrMedia<T> for std::result::Result<T, E> {
    fn or_media(self, operation: &str) -> Result<T> {
        self.map_err(|e| MediaError::new(operation, e))
    }
}

/// Fails `operation` with `detail` unless `condition` holds.
pub fn ensure(condition: bool, operation: &str, detail: impl Display) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(MediaError::new(operation, detail))
    }
}
