//! Application contract
//!
//! The launcher owns at most one [`Application`] at a time and drives it
//! through a fixed lifecycle:
//!
//! 1. constructed by an [`AppFactory`] (configuration is read here)
//! 2. `on_enter()` once
//! 3. per frame: `collect_events()`, `update()`, `render()`
//! 4. `on_exit()` once, after which the application is dropped

use pirate_core::{AppId, ButtonEvent, DisplaySink, PowerAction, Result, Tick};
use pirate_synth::MidiMessage;

/// One entry of a frame's event sequence
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// Debounced button transition from the input source
    Button(ButtonEvent),
    /// The audio engine reached the end of the loaded track
    TrackEnded,
    /// The audio engine reported a failure since the last frame
    EngineError(String),
    /// Note message from the MIDI keyboard
    Midi(MidiMessage),
}

/// What the application wants the launcher to do after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRequest {
    /// Keep running
    #[default]
    Continue,
    /// Tear down and return to the main menu
    ExitToMenu,
    /// Tear down and launch another application
    SwitchTo(AppId),
    /// Tear down and reboot or power off
    Power(PowerAction),
}

/// A full-screen program started from the main menu
pub trait Application {
    fn id(&self) -> AppId;

    /// Called once after construction, before the first update
    fn on_enter(&mut self, now: std::time::Duration) -> Result<()>;

    /// Events produced by the application's engines since the last frame
    ///
    /// Returned events are placed ahead of the frame's button events.
    fn collect_events(&mut self, tick: &Tick) -> Vec<FrameEvent> {
        let _ = tick;
        Vec::new()
    }

    /// Advance by one frame
    fn update(&mut self, tick: &Tick, events: &[FrameEvent]) -> Result<AppRequest>;

    /// Draw the current state; must not change it
    fn render(&self, tick: &Tick, display: &mut dyn DisplaySink);

    /// Called once before the application is dropped
    ///
    /// Any audio or MIDI activity started by the application has stopped
    /// when this returns.
    fn on_exit(&mut self);
}

/// Builds applications on demand
pub trait AppFactory {
    fn create(&mut self, id: AppId) -> Result<Box<dyn Application>>;
}
