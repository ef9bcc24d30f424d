//! GPIO level readers

use crate::config::ButtonPins;
use pirate_core::{Button, PirateError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads the current pressed state of all four buttons
pub trait PinReader {
    /// Pressed state indexed like [`Button::ALL`]
    fn read_levels(&mut self) -> Result<[bool; 4]>;
}

/// Button lines read through the sysfs GPIO interface
///
/// The HAT wires the buttons active-low with pull-ups, so a `0` in the value
/// file means pressed.
#[derive(Debug)]
pub struct SysfsGpio {
    value_files: [PathBuf; 4],
}

impl SysfsGpio {
    /// Export the button pins under `root` and configure them as inputs
    pub fn open(root: impl AsRef<Path>, pins: ButtonPins) -> Result<Self> {
        let root = root.as_ref();
        let value_files = Button::ALL.map(|button| {
            root.join(format!("gpio{}", pins.pin(button)))
                .join("value")
        });

        for button in Button::ALL {
            let pin = pins.pin(button);
            let line = root.join(format!("gpio{pin}"));

            if !line.exists() {
                debug!(pin, %button, "Exporting GPIO line");
                fs::write(root.join("export"), pin.to_string()).map_err(|e| {
                    PirateError::device(format!("Failed to export GPIO {pin}: {e}"))
                })?;
            }

            // Direction may be fixed by a device-tree overlay
            if let Err(e) = fs::write(line.join("direction"), "in") {
                warn!(pin, error = %e, "Could not set GPIO direction");
            }

            let value = &value_files[button.index()];
            fs::read_to_string(value).map_err(|e| {
                PirateError::device(format!("GPIO {pin} not readable at {}: {e}", value.display()))
            })?;
        }

        Ok(Self { value_files })
    }
}

impl PinReader for SysfsGpio {
    fn read_levels(&mut self) -> Result<[bool; 4]> {
        let mut levels = [false; 4];
        for (level, path) in levels.iter_mut().zip(&self.value_files) {
            let raw = fs::read_to_string(path)?;
            *level = raw.trim() == "0";
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_sysfs(pins: ButtonPins, exported: bool) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        if exported {
            for button in Button::ALL {
                let line = dir.path().join(format!("gpio{}", pins.pin(button)));
                fs::create_dir_all(&line).unwrap();
                fs::write(line.join("direction"), "out").unwrap();
                fs::write(line.join("value"), "1\n").unwrap();
            }
        }
        dir
    }

    #[test]
    fn reads_active_low_levels() {
        let pins = ButtonPins::default();
        let dir = fake_sysfs(pins, true);
        fs::write(dir.path().join("gpio16/value"), "0\n").unwrap();

        let mut gpio = SysfsGpio::open(dir.path(), pins).unwrap();
        assert_eq!(gpio.read_levels().unwrap(), [false, false, true, false]);
        assert_eq!(
            fs::read_to_string(dir.path().join("gpio5/direction")).unwrap(),
            "in"
        );
    }

    #[test]
    fn missing_line_is_a_device_error() {
        let pins = ButtonPins::default();
        let dir = fake_sysfs(pins, false);
        let err = SysfsGpio::open(dir.path(), pins).unwrap_err();
        assert!(matches!(err, PirateError::Device(_)));
    }
}
