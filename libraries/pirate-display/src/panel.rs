//! Physical display devices

use crate::error::{DisplayError, Result};
use crate::framebuffer::FrameBuffer;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A device that shows complete frames
pub trait Panel {
    /// Show `frame`
    fn flush(&mut self, frame: &FrameBuffer) -> Result<()>;

    /// Switch the backlight
    fn set_backlight(&mut self, on: bool) -> Result<()>;
}

/// Linux framebuffer device (e.g. `/dev/fb1` from the panel's fbtft overlay)
#[derive(Debug)]
pub struct LinuxFramebuffer {
    device: File,
    path: PathBuf,
    backlight: Option<PathBuf>,
}

impl LinuxFramebuffer {
    /// Open the framebuffer device for writing
    ///
    /// `backlight` is a sysfs `brightness` file; `None` leaves the backlight
    /// alone.
    pub fn open(path: impl AsRef<Path>, backlight: Option<PathBuf>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let device = OpenOptions::new().write(true).open(&path).map_err(|e| {
            DisplayError::Device(format!("Cannot open {}: {e}", path.display()))
        })?;
        info!(device = %path.display(), "Opened framebuffer");
        Ok(Self {
            device,
            path,
            backlight,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Panel for LinuxFramebuffer {
    fn flush(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.device.seek(SeekFrom::Start(0))?;
        self.device.write_all(&frame.to_le_bytes())?;
        self.device.flush()?;
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<()> {
        let Some(brightness) = &self.backlight else {
            return Ok(());
        };
        let level = if on {
            brightness
                .parent()
                .map(|dir| dir.join("max_brightness"))
                .and_then(|max| fs::read_to_string(max).ok())
                .map(|max| max.trim().to_string())
                .unwrap_or_else(|| "1".to_string())
        } else {
            "0".to_string()
        };
        debug!(path = %brightness.display(), %level, "Setting backlight");
        fs::write(brightness, level)?;
        Ok(())
    }
}
