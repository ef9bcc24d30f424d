//! Pirate OS Core
//!
//! Hardware-agnostic building blocks shared by every Pirate OS crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Button`, `ButtonEvent`, `AppId`, `Tick`, `Rgb`, `Bitmap`
//! - **Hardware Contracts**: `InputSource`, `DisplaySink`, `PowerControl`
//! - **Error Handling**: Unified `PirateError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use pirate_core::{Button, ButtonEvent, ButtonEventKind, WrappingCursor};
//! use std::time::Duration;
//!
//! let event = ButtonEvent::new(Button::X, ButtonEventKind::Pressed, Duration::from_millis(12));
//! assert!(event.is_press_of(Button::X));
//!
//! let mut cursor = WrappingCursor::new(4);
//! cursor.previous();
//! assert_eq!(cursor.index(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backoff;
pub mod cursor;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use backoff::Backoff;
pub use cursor::WrappingCursor;
pub use error::{PirateError, Result};
pub use traits::{DisplaySink, InputSource, PowerControl};
pub use types::{
    // Input
    Button, ButtonEvent, ButtonEventKind,
    // Applications and frames
    AppId, PowerAction, Tick,
    // Drawing
    Bitmap, FontSize, Point, Rgb,
};
