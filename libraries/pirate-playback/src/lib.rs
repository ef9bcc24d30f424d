//! Pirate OS playback
//!
//! Hardware-independent parts of the music player:
//!
//! - [`MusicLibrary`]: album directories scanned from disk, with art detection
//! - [`LibraryCache`]: JSON cache of the library plus the last playback state
//! - [`Volume`]: 0..1 volume level with a perceptual gain curve
//! - [`AudioEngine`]: contract for the external mixer/decoder
//!
//! # Example
//!
//! ```rust
//! use pirate_playback::Volume;
//!
//! let mut volume = Volume::new(0.5);
//! volume.step(0.02);
//! assert_eq!(volume.percent(), 52);
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod library;
pub mod volume;

pub use cache::{LastState, LibraryCache};
pub use engine::{AudioEngine, EngineEvent};
pub use error::{PlaybackError, Result};
pub use library::{song_title, Album, MusicLibrary, UNKNOWN_ARTIST};
pub use volume::Volume;
