//! Input timing and pin assignment

use pirate_core::Button;
use std::time::Duration;

/// Default debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// Default hold threshold in milliseconds
pub const DEFAULT_HOLD_MS: u64 = 600;

/// Default hold repeat interval in milliseconds
pub const DEFAULT_REPEAT_MS: u64 = 150;

/// Timing parameters for button tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    /// Transitions closer than this to the previous accepted one are ignored
    pub debounce: Duration,
    /// How long a button must stay down before the first hold event
    pub hold_threshold: Duration,
    /// Interval between subsequent hold events
    pub repeat_interval: Duration,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            hold_threshold: Duration::from_millis(DEFAULT_HOLD_MS),
            repeat_interval: Duration::from_millis(DEFAULT_REPEAT_MS),
        }
    }
}

impl InputConfig {
    /// Build from millisecond values
    ///
    /// A zero repeat interval would make a held button emit without bound, so
    /// it is raised to 1 ms.
    pub fn from_millis(debounce_ms: u64, hold_ms: u64, repeat_ms: u64) -> Self {
        Self {
            debounce: Duration::from_millis(debounce_ms),
            hold_threshold: Duration::from_millis(hold_ms),
            repeat_interval: Duration::from_millis(repeat_ms.max(1)),
        }
    }
}

/// BCM pin numbers of the four buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPins {
    pub a: u32,
    pub b: u32,
    pub x: u32,
    pub y: u32,
}

impl Default for ButtonPins {
    fn default() -> Self {
        Self {
            a: 5,
            b: 6,
            x: 16,
            y: 24,
        }
    }
}

impl ButtonPins {
    /// Pin wired to `button`
    pub fn pin(&self, button: Button) -> u32 {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::X => self.x,
            Button::Y => self.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hat_wiring() {
        let pins = ButtonPins::default();
        assert_eq!(pins.pin(Button::A), 5);
        assert_eq!(pins.pin(Button::B), 6);
        assert_eq!(pins.pin(Button::X), 16);
        assert_eq!(pins.pin(Button::Y), 24);
    }

    #[test]
    fn zero_repeat_is_raised() {
        let config = InputConfig::from_millis(20, 600, 0);
        assert_eq!(config.repeat_interval, Duration::from_millis(1));
    }
}
