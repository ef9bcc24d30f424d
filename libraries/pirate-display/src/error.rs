//! Display error types

use pirate_core::PirateError;
use thiserror::Error;

/// Result type for display operations
pub type Result<T> = std::result::Result<T, DisplayError>;

/// Errors from the display device or image loading
#[derive(Error, Debug)]
pub enum DisplayError {
    /// Framebuffer or backlight I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Device could not be opened or has the wrong geometry
    #[error("Display device error: {0}")]
    Device(String),

    /// Image file could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Decoded image has an unexpected shape
    #[error("Invalid image: {0}")]
    Format(String),
}

impl From<DisplayError> for PirateError {
    fn from(err: DisplayError) -> Self {
        match err {
            DisplayError::Io(e) => PirateError::display(e.to_string()),
            DisplayError::Device(msg) => PirateError::display(msg),
            DisplayError::Image(e) => PirateError::resource_load("image", e.to_string()),
            DisplayError::Format(msg) => PirateError::resource_load("image", msg),
        }
    }
}
