//! Pirate OS audio backends
//!
//! Concrete implementations of the engine contracts:
//!
//! - [`CpalMixer`]: [`AudioEngine`] that decodes with Symphonia on a
//!   background thread and plays through a CPAL output stream
//! - [`FluidSynthProcess`]: [`SynthEngine`] driving a `fluidsynth` child
//!   process through its command shell
//! - [`MidirInput`]: [`MidiInput`] on top of `midir`
//!
//! [`AudioEngine`]: pirate_playback::AudioEngine
//! [`SynthEngine`]: pirate_synth::SynthEngine
//! [`MidiInput`]: pirate_synth::MidiInput

mod decoder;
mod fluidsynth;
mod midi;
mod mixer;

pub use decoder::{DecodedTrack, TrackDecoder};
pub use fluidsynth::{FluidSynthProcess, FluidSynthSettings, FluidSynthShell};
pub use midi::MidirInput;
pub use mixer::CpalMixer;
