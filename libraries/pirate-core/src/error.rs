/// Core error types for Pirate OS
use thiserror::Error;

/// Result type alias using `PirateError`
pub type Result<T> = std::result::Result<T, PirateError>;

/// Core error type for Pirate OS
///
/// The first four variants are the recoverable error classes the launcher
/// and applications act on. None of them is fatal once the appliance runs.
#[derive(Error, Debug)]
pub enum PirateError {
    /// Malformed or missing configuration (defaults are used instead)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A directory, SoundFont or song could not be loaded
    #[error("Failed to load {resource}: {reason}")]
    ResourceLoad { resource: String, reason: String },

    /// Audio engine, MIDI port or GPIO line unavailable
    #[error("Device unavailable: {0}")]
    Device(String),

    /// Reboot or shutdown command failed
    #[error("Power action failed: {0}")]
    PowerAction(String),

    /// Display device errors
    #[error("Display error: {0}")]
    Display(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PirateError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a resource load error
    pub fn resource_load(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceLoad {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a power action error
    pub fn power_action(msg: impl Into<String>) -> Self {
        Self::PowerAction(msg.into())
    }

    /// Create a display error
    pub fn display(msg: impl Into<String>) -> Self {
        Self::Display(msg.into())
    }
}
