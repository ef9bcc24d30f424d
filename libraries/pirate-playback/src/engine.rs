//! Audio engine contract
//!
//! The player never decodes audio itself. It hands file paths to an
//! [`AudioEngine`] and reads back position and completion. Completion is
//! queued inside the engine and collected with [`AudioEngine::poll_events`]
//! at the start of a frame; engines never call back into the player.

use crate::error::Result;
use std::path::Path;
use std::time::Duration;

/// Notification from the engine, collected once per frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The loaded track played to its end
    TrackEnded,
    /// Playback stopped because of an error
    Error(String),
}

/// Mixer/decoder for file playback
pub trait AudioEngine {
    /// Load `path`, replacing the current track
    ///
    /// The track is left paused at its start. Returns the track length when
    /// the container reports one.
    fn load(&mut self, path: &Path) -> Result<Option<Duration>>;

    /// Start or resume playback of the loaded track
    fn play(&mut self);

    /// Pause, keeping the position
    fn pause(&mut self);

    /// Stop playback and release the track
    fn stop(&mut self);

    /// Set output volume (0.0..=1.0)
    fn set_volume(&mut self, level: f32);

    /// Position in the loaded track
    fn position(&self) -> Duration;

    /// Whether audio is currently being produced
    fn is_playing(&self) -> bool;

    /// Drain queued notifications
    fn poll_events(&mut self) -> Vec<EngineEvent>;
}
