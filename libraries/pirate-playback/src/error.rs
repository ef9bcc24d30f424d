//! Error types for playback

use pirate_core::PirateError;
use std::path::PathBuf;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Music directory or song file does not exist
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// File exists but could not be decoded
    #[error("Cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// No usable audio output device
    #[error("Audio device error: {0}")]
    Device(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Library cache could not be (de)serialized
    #[error("Library cache error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Create a decode error
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

impl From<PlaybackError> for PirateError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::NotFound(path) => {
                PirateError::resource_load(path.display().to_string(), "not found")
            }
            PlaybackError::Decode { path, reason } => {
                PirateError::resource_load(path.display().to_string(), reason)
            }
            PlaybackError::Device(msg) => PirateError::Device(msg),
            PlaybackError::Io(e) => PirateError::Io(e),
            PlaybackError::Serialization(e) => PirateError::Serialization(e),
        }
    }
}
