//! Launchable applications

pub mod player;
pub mod synth;

pub use player::{MusicPlayerApp, PlayerView, SystemOption};
pub use synth::{EngineStarter, SynthApp, SynthMode};
