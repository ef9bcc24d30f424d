//! Common test doubles: recording display, counting power, scripted
//! applications and fake engines
#![allow(dead_code)]

use pirate_core::{
    AppId, Bitmap, Button, ButtonEvent, ButtonEventKind, DisplaySink, FontSize, PirateError, Point,
    PowerAction, PowerControl, Rgb, Tick,
};
use pirate_os::{AppFactory, AppRequest, Application, FrameEvent};
use pirate_playback::{AudioEngine, EngineEvent, PlaybackError};
use pirate_synth::{MidiInput, MidiMessage, SynthEngine, SynthError};
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

// ===== Time and input =====

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

pub fn tick_at(frame: u64, now_ms: u64) -> Tick {
    Tick {
        now: ms(now_ms),
        delta: ms(33),
        frame,
    }
}

pub fn event(button: Button, kind: ButtonEventKind, at_ms: u64) -> ButtonEvent {
    ButtonEvent::new(button, kind, ms(at_ms))
}

pub fn press(button: Button, at_ms: u64) -> ButtonEvent {
    event(button, ButtonEventKind::Pressed, at_ms)
}

pub fn release(button: Button, at_ms: u64) -> ButtonEvent {
    event(button, ButtonEventKind::Released, at_ms)
}

pub fn hold(button: Button, at_ms: u64) -> ButtonEvent {
    event(button, ButtonEventKind::HeldThresholdReached, at_ms)
}

/// Press and release as frame events
pub fn tap(button: Button, at_ms: u64) -> Vec<FrameEvent> {
    vec![
        FrameEvent::Button(press(button, at_ms)),
        FrameEvent::Button(release(button, at_ms + 80)),
    ]
}

// ===== Display =====

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Rgb),
    Text { pos: Point, text: String, color: Rgb },
    Rect { pos: Point, width: u32, height: u32, color: Rgb },
    Image { pos: Point, width: u32, height: u32 },
}

/// Display that records drawing calls and keeps every presented frame
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pending: Vec<DrawOp>,
    pub frames: Vec<Vec<DrawOp>>,
    pub backlight: Vec<bool>,
    pub fail_present: bool,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> &[DrawOp] {
        self.frames.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// All text drawn in the last presented frame
    pub fn last_texts(&self) -> Vec<String> {
        self.last_frame()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_frame_shows(&self, needle: &str) -> bool {
        self.last_texts().iter().any(|t| t.contains(needle))
    }

    pub fn text_color(&self, needle: &str) -> Option<Rgb> {
        self.last_frame().iter().find_map(|op| match op {
            DrawOp::Text { text, color, .. } if text.contains(needle) => Some(*color),
            _ => None,
        })
    }
}

impl DisplaySink for RecordingDisplay {
    fn size(&self) -> (u32, u32) {
        (240, 240)
    }

    fn clear(&mut self, color: Rgb) {
        self.pending.clear();
        self.pending.push(DrawOp::Clear(color));
    }

    fn draw_text(&mut self, pos: Point, text: &str, _font: FontSize, color: Rgb) {
        self.pending.push(DrawOp::Text {
            pos,
            text: text.to_string(),
            color,
        });
    }

    fn fill_rect(&mut self, pos: Point, width: u32, height: u32, color: Rgb) {
        self.pending.push(DrawOp::Rect {
            pos,
            width,
            height,
            color,
        });
    }

    fn draw_image(&mut self, pos: Point, bitmap: &Bitmap) {
        self.pending.push(DrawOp::Image {
            pos,
            width: bitmap.width(),
            height: bitmap.height(),
        });
    }

    fn set_backlight(&mut self, on: bool) -> pirate_core::Result<()> {
        self.backlight.push(on);
        Ok(())
    }

    fn present(&mut self) -> pirate_core::Result<()> {
        if self.fail_present {
            return Err(PirateError::display("panel unplugged"));
        }
        self.frames.push(std::mem::take(&mut self.pending));
        Ok(())
    }
}

// ===== Power =====

#[derive(Debug, Default)]
pub struct CountingPower {
    pub calls: Vec<PowerAction>,
    pub fail: bool,
}

impl CountingPower {
    pub fn failing() -> Self {
        Self {
            calls: Vec::new(),
            fail: true,
        }
    }
}

impl PowerControl for CountingPower {
    fn execute(&mut self, action: PowerAction) -> pirate_core::Result<()> {
        self.calls.push(action);
        if self.fail {
            return Err(PirateError::power_action("sudo: permission denied"));
        }
        Ok(())
    }
}

// ===== Scripted applications =====

/// Lifecycle calls seen by scripted applications, in order
pub type CallLog = Rc<RefCell<Vec<String>>>;

#[derive(Debug, Clone, Default)]
pub struct AppScript {
    /// Requests returned by successive updates; `Continue` once exhausted
    pub requests: VecDeque<AppRequest>,
    pub fail_enter: bool,
    pub panic_on_update: bool,
    pub error_on_update: bool,
    pub panic_on_render: bool,
}

pub struct ScriptedApp {
    id: AppId,
    log: CallLog,
    script: AppScript,
}

impl ScriptedApp {
    fn record(&self, call: &str) {
        self.log.borrow_mut().push(format!("{:?}:{call}", self.id));
    }
}

impl Application for ScriptedApp {
    fn id(&self) -> AppId {
        self.id
    }

    fn on_enter(&mut self, _now: Duration) -> pirate_core::Result<()> {
        self.record("enter");
        if self.script.fail_enter {
            return Err(PirateError::resource_load("/music", "gone"));
        }
        Ok(())
    }

    fn update(&mut self, _tick: &Tick, events: &[FrameEvent]) -> pirate_core::Result<AppRequest> {
        self.record(&format!("update({})", events.len()));
        if self.script.panic_on_update {
            panic!("scripted update panic");
        }
        if self.script.error_on_update {
            return Err(PirateError::device("scripted update error"));
        }
        Ok(self.script.requests.pop_front().unwrap_or_default())
    }

    fn render(&self, _tick: &Tick, display: &mut dyn DisplaySink) {
        self.log.borrow_mut().push(format!("{:?}:render", self.id));
        if self.script.panic_on_render {
            panic!("scripted render panic");
        }
        display.clear(Rgb::BLACK);
        display.draw_text(Point::new(0, 0), self.id.label(), FontSize::Small, Rgb::WHITE);
    }

    fn on_exit(&mut self) {
        self.record("exit");
    }
}

/// Factory handing out scripted applications that share one call log
#[derive(Default)]
pub struct ScriptedFactory {
    pub log: CallLog,
    pub scripts: Vec<(AppId, AppScript)>,
    pub unavailable: HashSet<AppId>,
    pub created: Vec<AppId>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, id: AppId, script: AppScript) -> Self {
        self.scripts.push((id, script));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl AppFactory for ScriptedFactory {
    fn create(&mut self, id: AppId) -> pirate_core::Result<Box<dyn Application>> {
        if self.unavailable.contains(&id) {
            return Err(PirateError::resource_load("/home/pi/Music", "music directory not found"));
        }
        self.created.push(id);
        let script = self
            .scripts
            .iter()
            .find(|(script_id, _)| *script_id == id)
            .map(|(_, script)| script.clone())
            .unwrap_or_default();
        Ok(Box::new(ScriptedApp {
            id,
            log: self.log.clone(),
            script,
        }))
    }
}

// ===== Audio engine =====

#[derive(Debug, Default)]
pub struct AudioState {
    pub loads: Vec<PathBuf>,
    pub playing: bool,
    pub volume: Option<f32>,
    pub stops: u32,
    pub position: Duration,
    pub pending: Vec<EngineEvent>,
    pub unreadable: HashSet<PathBuf>,
    pub device_failures: u32,
}

/// Engine that records calls into shared state
#[derive(Clone, Default)]
pub struct FakeAudio {
    pub state: Rc<RefCell<AudioState>>,
}

impl FakeAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn AudioEngine> {
        Box::new(self.clone())
    }
}

impl AudioEngine for FakeAudio {
    fn load(&mut self, path: &Path) -> pirate_playback::Result<Option<Duration>> {
        let mut state = self.state.borrow_mut();
        state.loads.push(path.to_path_buf());
        state.playing = false;
        state.position = Duration::ZERO;
        if state.device_failures > 0 {
            state.device_failures -= 1;
            return Err(PlaybackError::device("no audio device"));
        }
        if state.unreadable.contains(path) {
            return Err(PlaybackError::decode(path, "not an mp3"));
        }
        Ok(Some(Duration::from_secs(180)))
    }

    fn play(&mut self) {
        self.state.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.stops += 1;
    }

    fn set_volume(&mut self, level: f32) {
        self.state.borrow_mut().volume = Some(level);
    }

    fn position(&self) -> Duration {
        self.state.borrow().position
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }
}

// ===== Synthesizer engine =====

#[derive(Debug, Default)]
pub struct SynthState {
    pub calls: Vec<String>,
    pub starts: u32,
    pub start_failures: u32,
    pub shut_down: bool,
    pub dead: bool,
}

#[derive(Clone, Default)]
pub struct FakeSynth {
    pub state: Rc<RefCell<SynthState>>,
}

impl FakeSynth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_starts(failures: u32) -> Self {
        let synth = Self::default();
        synth.state.borrow_mut().start_failures = failures;
        synth
    }

    /// Starter closure for `SynthApp::new`
    pub fn starter(&self) -> pirate_os::apps::EngineStarter {
        let synth = self.clone();
        Box::new(move |gain| {
            let mut state = synth.state.borrow_mut();
            if state.start_failures > 0 {
                state.start_failures -= 1;
                return Err(SynthError::device("fluidsynth missing"));
            }
            state.starts += 1;
            state.shut_down = false;
            state.dead = false;
            state.calls.push(format!("start {gain:.2}"));
            drop(state);
            Ok(Box::new(synth.clone()) as Box<dyn SynthEngine>)
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Simulate the engine process exiting on its own
    pub fn kill(&self) {
        self.state.borrow_mut().dead = true;
    }

    pub fn starts(&self) -> u32 {
        self.state.borrow().starts
    }
}

impl SynthEngine for FakeSynth {
    fn load_soundfont(&mut self, path: &Path) -> pirate_synth::Result<()> {
        if !path.exists() {
            return Err(SynthError::NotFound(path.to_path_buf()));
        }
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        self.state.borrow_mut().calls.push(format!("load {name}"));
        Ok(())
    }

    fn note_on(&mut self, channel: u8, key: u8, velocity: u8) {
        self.state.borrow_mut().calls.push(format!("noteon {channel} {key} {velocity}"));
    }

    fn note_off(&mut self, channel: u8, key: u8) {
        self.state.borrow_mut().calls.push(format!("noteoff {channel} {key}"));
    }

    fn set_gain(&mut self, gain: f32) {
        self.state.borrow_mut().calls.push(format!("gain {gain:.2}"));
    }

    fn all_notes_off(&mut self) {
        self.state.borrow_mut().calls.push("reset".to_string());
    }

    fn is_alive(&mut self) -> bool {
        !self.state.borrow().dead
    }

    fn shutdown(&mut self) {
        let mut state = self.state.borrow_mut();
        state.calls.push("quit".to_string());
        state.shut_down = true;
    }
}

// ===== MIDI input =====

#[derive(Debug, Default)]
pub struct MidiState {
    pub available: bool,
    pub connected: bool,
    pub attempts: u32,
    pub queued: Vec<MidiMessage>,
    pub requested_ids: Vec<Option<usize>>,
}

#[derive(Clone, Default)]
pub struct FakeMidi {
    pub state: Rc<RefCell<MidiState>>,
}

impl FakeMidi {
    pub fn new(available: bool) -> Self {
        let midi = Self::default();
        midi.state.borrow_mut().available = available;
        midi
    }

    pub fn boxed(&self) -> Box<dyn MidiInput> {
        Box::new(self.clone())
    }

    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    pub fn queue(&self, message: MidiMessage) {
        self.state.borrow_mut().queued.push(message);
    }

    pub fn attempts(&self) -> u32 {
        self.state.borrow().attempts
    }
}

impl MidiInput for FakeMidi {
    fn connect(&mut self, device_id: Option<usize>) -> pirate_synth::Result<String> {
        let mut state = self.state.borrow_mut();
        state.attempts += 1;
        state.requested_ids.push(device_id);
        if !state.available {
            return Err(SynthError::device("no MIDI input ports"));
        }
        state.connected = true;
        Ok("USB Keyboard".to_string())
    }

    fn is_connected(&mut self) -> bool {
        let state = self.state.borrow();
        state.connected && state.available
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.connected = false;
        state.queued.clear();
    }

    fn poll(&mut self) -> Vec<MidiMessage> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return Vec::new();
        }
        std::mem::take(&mut state.queued)
    }
}
