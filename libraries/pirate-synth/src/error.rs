//! Error types for the synthesizer

use pirate_core::PirateError;
use std::path::PathBuf;
use thiserror::Error;

/// Synthesizer errors
#[derive(Debug, Error)]
pub enum SynthError {
    /// SoundFont directory or file does not exist
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// The engine refused a SoundFont
    #[error("Cannot load SoundFont {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Synth engine or MIDI port unavailable
    #[error("Device error: {0}")]
    Device(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Library cache could not be (de)serialized
    #[error("Library cache error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SynthError {
    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a load error
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for synthesizer operations
pub type Result<T> = std::result::Result<T, SynthError>;

impl From<SynthError> for PirateError {
    fn from(err: SynthError) -> Self {
        match err {
            SynthError::NotFound(path) => {
                PirateError::resource_load(path.display().to_string(), "not found")
            }
            SynthError::Load { path, reason } => {
                PirateError::resource_load(path.display().to_string(), reason)
            }
            SynthError::Device(msg) => PirateError::Device(msg),
            SynthError::Io(e) => PirateError::Io(e),
            SynthError::Serialization(e) => PirateError::Serialization(e),
        }
    }
}
