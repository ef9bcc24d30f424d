//! Pirate OS display
//!
//! Everything is drawn into an off-screen RGB565 [`FrameBuffer`] with
//! `embedded-graphics`; [`BufferedDisplay::present`] hands the finished frame
//! to a [`Panel`] in one write, so partial frames are never visible.

#![forbid(unsafe_code)]

pub mod art;
pub mod error;
pub mod framebuffer;
pub mod panel;
pub mod sink;

pub use art::{load_bitmap, ArtLoader, LoadedArt};
pub use error::{DisplayError, Result};
pub use framebuffer::FrameBuffer;
pub use panel::{LinuxFramebuffer, Panel};
pub use sink::BufferedDisplay;

/// Screen width of the display HAT
pub const SCREEN_WIDTH: u32 = 240;

/// Screen height of the display HAT
pub const SCREEN_HEIGHT: u32 = 240;
