//! Pirate OS synthesizer
//!
//! Hardware-independent parts of the MIDI synthesizer:
//!
//! - [`Gain`]: output gain clamped to a configurable maximum
//! - [`scan_soundfonts`] and [`SoundFontCache`]: the `*.sf2` list and its cache
//! - [`MidiMessage`]: note on/off filtering of raw MIDI bytes
//! - [`MidiInput`] / [`SynthEngine`]: contracts for the MIDI port and the
//!   external SoundFont synthesizer

pub mod cache;
pub mod engine;
pub mod error;
pub mod gain;
pub mod midi;
pub mod soundfonts;

pub use cache::SoundFontCache;
pub use engine::SynthEngine;
pub use error::{Result, SynthError};
pub use gain::Gain;
pub use midi::{MidiInput, MidiMessage};
pub use soundfonts::{scan_soundfonts, soundfont_name};
