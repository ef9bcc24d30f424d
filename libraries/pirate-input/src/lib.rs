//! Pirate OS button input
//!
//! Turns raw active-low GPIO levels into debounced [`ButtonEvent`]s:
//!
//! - [`ButtonTracker`]: per-button debounce, hold threshold and repeat timer
//! - [`ButtonInput`]: an [`InputSource`] that samples a [`PinReader`] every poll
//! - [`SysfsGpio`]: `PinReader` backed by `/sys/class/gpio`
//! - [`GestureTracker`]: tap vs. hold interpretation used by the applications
//!
//! [`ButtonEvent`]: pirate_core::ButtonEvent
//! [`InputSource`]: pirate_core::InputSource

#![forbid(unsafe_code)]

mod config;
mod gesture;
mod gpio;
mod source;
mod tracker;

pub use config::{ButtonPins, InputConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_HOLD_MS, DEFAULT_REPEAT_MS};
pub use gesture::{Gesture, GestureTracker};
pub use gpio::{PinReader, SysfsGpio};
pub use source::ButtonInput;
pub use tracker::{ButtonTracker, InputTracker};
