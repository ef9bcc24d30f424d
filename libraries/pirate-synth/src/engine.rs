//! SoundFont synthesizer contract

use crate::error::Result;
use std::path::Path;

/// External SoundFont synthesizer
///
/// Note calls are fire-and-forget; only SoundFont loading reports failure.
pub trait SynthEngine {
    /// Replace the current SoundFont with `path` and select its first preset
    /// on channel 0
    fn load_soundfont(&mut self, path: &Path) -> Result<()>;

    fn note_on(&mut self, channel: u8, key: u8, velocity: u8);

    fn note_off(&mut self, channel: u8, key: u8);

    /// Master gain
    fn set_gain(&mut self, gain: f32);

    /// Silence every sounding note
    fn all_notes_off(&mut self);

    /// Whether the engine still accepts commands
    ///
    /// False once the process behind it has exited or its command pipe broke.
    fn is_alive(&mut self) -> bool;

    /// Stop the engine; further calls are no-ops
    fn shutdown(&mut self);
}
