//! SoundFont synthesizer
//!
//! Plays the notes of a USB MIDI keyboard through the selected SoundFont.
//! The list of `*.sf2` files is rescanned on every enter; the last selection
//! and gain are remembered in the library file.

use crate::app::{AppRequest, Application, FrameEvent};
use crate::config::SynthConfig;
use crate::ui::{draw_list, truncate, ListStyle};
use pirate_core::{
    AppId, Backoff, Button, DisplaySink, FontSize, PirateError, Point, Result, Rgb, Tick,
    WrappingCursor,
};
use pirate_input::{Gesture, GestureTracker};
use pirate_synth::{
    scan_soundfonts, soundfont_name, Gain, MidiInput, MidiMessage, SoundFontCache, SynthEngine,
    SynthError,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Gain change per hold event
pub const GAIN_STEP: f32 = 0.02;

/// Engine channel every keyboard note is played on
const NOTE_CHANNEL: u8 = 0;

const MESSAGE_DURATION: Duration = Duration::from_secs(2);

const LIST_STYLE: ListStyle = ListStyle {
    top: 45,
    row_height: 20,
    row_gap: 3,
    visible_rows: 7,
    max_chars: 22,
    font: FontSize::Medium,
    highlight: Rgb::CYAN,
    selected_text: Rgb::BLACK,
    text: Rgb::WHITE,
};

/// Starts the synthesis engine at the given gain
pub type EngineStarter = Box<dyn FnMut(f32) -> pirate_synth::Result<Box<dyn SynthEngine>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthMode {
    /// Choosing a SoundFont
    BrowsingSoundFonts,
    /// The selected SoundFont is loaded and the keyboard plays it
    KeyboardActive,
}

#[derive(Debug, Clone)]
struct Message {
    title: &'static str,
    detail: String,
    until: Duration,
}

pub struct SynthApp {
    config: SynthConfig,
    start_engine: EngineStarter,
    engine: Option<Box<dyn SynthEngine>>,
    engine_retry: Backoff,
    midi: Box<dyn MidiInput>,
    midi_port: Option<String>,
    midi_check: Backoff,
    soundfonts: Vec<PathBuf>,
    cursor: WrappingCursor,
    /// SoundFont to load once the engine is up
    wanted: Option<usize>,
    loaded: Option<usize>,
    mode: SynthMode,
    gain: Gain,
    gestures: GestureTracker,
    message: Option<Message>,
}

impl SynthApp {
    /// Create the synthesizer; fails if the SoundFont directory does not exist
    pub fn new(config: SynthConfig, start_engine: EngineStarter, midi: Box<dyn MidiInput>) -> Result<Self> {
        if !config.soundfont_dir.is_dir() {
            return Err(PirateError::resource_load(
                config.soundfont_dir.display().to_string(),
                "SoundFont directory not found",
            ));
        }
        let gain = config.gain();
        Ok(Self {
            config,
            start_engine,
            engine: None,
            engine_retry: Backoff::default(),
            midi,
            midi_port: None,
            midi_check: Backoff::default(),
            soundfonts: Vec::new(),
            cursor: WrappingCursor::default(),
            wanted: None,
            loaded: None,
            mode: SynthMode::BrowsingSoundFonts,
            gain,
            gestures: GestureTracker::new(),
            message: None,
        })
    }

    pub fn soundfonts(&self) -> &[PathBuf] {
        &self.soundfonts
    }

    pub fn selected(&self) -> usize {
        self.cursor.index()
    }

    pub fn loaded(&self) -> Option<usize> {
        self.loaded
    }

    pub fn mode(&self) -> SynthMode {
        self.mode
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    pub fn midi_port(&self) -> Option<&str> {
        self.midi_port.as_deref()
    }

    pub fn engine_running(&self) -> bool {
        self.engine.is_some()
    }

    /// Title of the transient message showing at `now`
    pub fn message(&self, now: Duration) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|m| now < m.until)
            .map(|m| m.title)
    }

    // ===== Library =====

    fn rescan(&mut self) -> Result<Option<SoundFontCache>> {
        self.soundfonts = scan_soundfonts(&self.config.soundfont_dir)?;
        info!(
            count = self.soundfonts.len(),
            dir = %self.config.soundfont_dir.display(),
            "SoundFonts scanned"
        );

        match SoundFontCache::load(&self.config.library_file) {
            Ok(cache) => Ok(cache),
            Err(e) => {
                warn!(path = %self.config.library_file.display(), error = %e, "Unreadable SoundFont cache");
                Ok(None)
            }
        }
    }

    fn save_cache(&self) {
        let cache = SoundFontCache {
            soundfonts: self.soundfonts.clone(),
            last_selection: self.cursor.index(),
            last_gain: Some(self.gain.value()),
        };
        if let Err(e) = cache.save(&self.config.library_file) {
            warn!(path = %self.config.library_file.display(), error = %e, "Failed to save SoundFont cache");
        }
    }

    // ===== Engine =====

    fn try_start_engine(&mut self, now: Duration) {
        match (self.start_engine)(self.gain.value()) {
            Ok(engine) => {
                info!(gain = self.gain.value(), "Synth engine started");
                self.engine = Some(engine);
                self.engine_retry.record_success(now);
                if let Some(index) = self.wanted {
                    self.load(index, now);
                }
            }
            Err(e) => {
                self.engine_retry.record_failure(now);
                warn!(error = %e, retry_in = ?self.engine_retry.current_delay(), "Synth engine unavailable");
            }
        }
    }

    fn load(&mut self, index: usize, now: Duration) {
        let Some(path) = self.soundfonts.get(index).cloned() else {
            return;
        };
        self.wanted = Some(index);

        if !path.exists() {
            warn!(path = %path.display(), "SoundFont not found");
            self.show_message("SoundFont not found!", soundfont_name(&path), now);
            self.mode = SynthMode::BrowsingSoundFonts;
            return;
        }

        let Some(engine) = self.engine.as_mut() else {
            debug!(path = %path.display(), "Engine not running, SoundFont load deferred");
            return;
        };

        match engine.load_soundfont(&path) {
            Ok(()) => {
                info!(soundfont = %soundfont_name(&path), "SoundFont loaded");
                self.loaded = Some(index);
                self.mode = SynthMode::KeyboardActive;
                self.save_cache();
            }
            Err(SynthError::NotFound(_)) => {
                warn!(path = %path.display(), "SoundFont vanished");
                self.show_message("SoundFont not found!", soundfont_name(&path), now);
                self.mode = SynthMode::BrowsingSoundFonts;
            }
            Err(SynthError::Device(reason)) => {
                warn!(reason = %reason, "Synth engine stopped responding");
                self.stop_engine();
                self.engine_retry.record_failure(now);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load SoundFont");
                self.show_message("Can't load SoundFont", soundfont_name(&path), now);
                self.mode = SynthMode::BrowsingSoundFonts;
            }
        }
    }

    fn stop_engine(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.all_notes_off();
            engine.shutdown();
        }
        self.loaded = None;
    }

    /// Drop an engine whose process has gone away and schedule a restart
    fn check_engine(&mut self, now: Duration) {
        let dead = self.engine.as_mut().is_some_and(|engine| !engine.is_alive());
        if !dead {
            return;
        }
        warn!("Synth engine exited, restarting");
        self.stop_engine();
        if self.mode == SynthMode::KeyboardActive {
            self.mode = SynthMode::BrowsingSoundFonts;
        }
        self.engine_retry.record_failure(now);
    }

    fn change_gain(&mut self, delta: f32) {
        if self.gain.adjust(delta) {
            if let Some(engine) = self.engine.as_mut() {
                engine.set_gain(self.gain.value());
            }
            debug!(gain = self.gain.percent(), "Gain changed");
        }
    }

    fn play(&mut self, message: MidiMessage) {
        if self.loaded.is_none() {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match message {
            MidiMessage::NoteOn { key, velocity } => engine.note_on(NOTE_CHANNEL, key, velocity),
            MidiMessage::NoteOff { key } => engine.note_off(NOTE_CHANNEL, key),
        }
    }

    // ===== MIDI =====

    fn check_midi(&mut self, now: Duration) {
        if !self.midi_check.is_due(now) {
            return;
        }

        if self.midi_port.is_some() {
            if self.midi.is_connected() {
                self.midi_check.record_success(now);
                return;
            }
            warn!(port = self.midi_port.as_deref().unwrap_or_default(), "MIDI keyboard disconnected");
            self.midi.disconnect();
            self.midi_port = None;
            self.midi_check.reset();
            if let Some(engine) = self.engine.as_mut() {
                engine.all_notes_off();
            }
        }

        match self.midi.connect(self.config.midi.device_id) {
            Ok(port) => {
                info!(port = %port, "MIDI keyboard connected");
                self.midi_port = Some(port);
                self.midi_check.record_success(now);
            }
            Err(e) => {
                self.midi_check.record_failure(now);
                debug!(error = %e, retry_in = ?self.midi_check.current_delay(), "No MIDI keyboard");
            }
        }
    }

    // ===== Input =====

    fn handle_gesture(&mut self, gesture: Gesture, now: Duration) -> AppRequest {
        match gesture {
            Gesture::Tap(Button::A) => {
                self.cursor.previous();
                self.mode = SynthMode::BrowsingSoundFonts;
            }
            Gesture::Tap(Button::X) => {
                self.cursor.next();
                self.mode = SynthMode::BrowsingSoundFonts;
            }
            Gesture::Tap(Button::B) => self.load(self.cursor.index(), now),
            Gesture::Tap(Button::Y) => return AppRequest::ExitToMenu,
            Gesture::Hold { button: Button::A, .. } => self.change_gain(-GAIN_STEP),
            Gesture::Hold { button: Button::X, .. } => self.change_gain(GAIN_STEP),
            Gesture::Hold { .. } | Gesture::Press(_) => {}
        }
        AppRequest::Continue
    }

    fn show_message(&mut self, title: &'static str, detail: String, now: Duration) {
        self.message = Some(Message {
            title,
            detail,
            until: now + MESSAGE_DURATION,
        });
    }

    // ===== Drawing =====

    fn draw_status(&self, display: &mut dyn DisplaySink) {
        let (width, height) = display.size();
        let y = height as i32 - 25;

        let (status, color) = if self.midi_port.is_some() {
            ("MIDI: CONNECTED", Rgb::LIME)
        } else {
            ("MIDI: NOT FOUND", Rgb::ORANGE)
        };
        display.draw_text(Point::new(10, y), status, FontSize::Medium, color);

        let gain = format!("Gain: {}%", self.gain.percent());
        let x = width as i32 - FontSize::Small.text_width(&gain) as i32 - 10;
        display.draw_text(Point::new(x, y + 2), &gain, FontSize::Small, Rgb::WHITE);
    }
}

impl Application for SynthApp {
    fn id(&self) -> AppId {
        AppId::Synth
    }

    fn on_enter(&mut self, now: Duration) -> Result<()> {
        let cache = self.rescan()?;

        let remembered = cache
            .as_ref()
            .and_then(|cache| cache.selected_in(&self.soundfonts).map(|index| (index, cache.last_gain)));
        let selection = match remembered {
            Some((index, last_gain)) => {
                if let Some(value) = last_gain {
                    self.gain = Gain::new(value, self.gain.max());
                }
                index
            }
            None => 0,
        };
        self.cursor = WrappingCursor::at(selection, self.soundfonts.len());
        self.loaded = None;
        self.mode = SynthMode::BrowsingSoundFonts;
        self.gestures.reset();
        self.message = None;

        info!(
            soundfonts = self.soundfonts.len(),
            selection = self.cursor.index(),
            gain = self.gain.percent(),
            "Synthesizer started"
        );

        self.wanted = (!self.soundfonts.is_empty()).then_some(self.cursor.index());
        if self.engine.is_none() {
            self.try_start_engine(now);
        } else if let Some(index) = self.wanted {
            self.load(index, now);
        }
        self.save_cache();
        self.check_midi(now);
        Ok(())
    }

    fn collect_events(&mut self, tick: &Tick) -> Vec<FrameEvent> {
        self.check_midi(tick.now);
        if self.midi_port.is_none() {
            return Vec::new();
        }
        self.midi.poll().into_iter().map(FrameEvent::Midi).collect()
    }

    fn update(&mut self, tick: &Tick, events: &[FrameEvent]) -> Result<AppRequest> {
        let now = tick.now;
        self.check_engine(now);

        for event in events {
            match event {
                FrameEvent::Button(button) => {
                    if let Some(gesture) = self.gestures.feed(button) {
                        let request = self.handle_gesture(gesture, now);
                        if request != AppRequest::Continue {
                            return Ok(request);
                        }
                    }
                }
                FrameEvent::Midi(message) => self.play(*message),
                FrameEvent::TrackEnded | FrameEvent::EngineError(_) => {}
            }
        }

        if self.engine.is_none() && self.engine_retry.is_due(now) {
            self.try_start_engine(now);
        }
        Ok(AppRequest::Continue)
    }

    fn render(&self, tick: &Tick, display: &mut dyn DisplaySink) {
        let (width, _) = display.size();
        display.clear(Rgb::BLACK);

        if let Some(message) = self.message.as_ref().filter(|m| tick.now < m.until) {
            display.draw_text(Point::new(20, 90), message.title, FontSize::Large, Rgb::RED);
            display.draw_text(Point::new(20, 120), &truncate(&message.detail, 22), FontSize::Medium, Rgb::WHITE);
            return;
        }

        display.draw_text(Point::new(10, 5), "MIDI SYNTH", FontSize::Large, Rgb::CYAN);
        display.fill_rect(Point::new(10, 35), width.saturating_sub(20), 1, Rgb::CYAN);

        if self.midi_port.is_none() {
            display.draw_text_centered(100, "Waiting for", FontSize::Large, Rgb::YELLOW);
            display.draw_text_centered(130, "MIDI Keyboard...", FontSize::Large, Rgb::YELLOW);
        } else if self.soundfonts.is_empty() {
            display.draw_text(Point::new(20, 100), "No SoundFonts found!", FontSize::Medium, Rgb::RED);
        } else {
            let names: Vec<String> = self.soundfonts.iter().map(|p| soundfont_name(p)).collect();
            let style = match self.mode {
                SynthMode::KeyboardActive => ListStyle {
                    highlight: Rgb::LIME,
                    ..LIST_STYLE
                },
                SynthMode::BrowsingSoundFonts => LIST_STYLE,
            };
            draw_list(display, &names, &self.cursor, &style);
        }

        if self.engine.is_none() {
            display.draw_text_centered(195, "Starting synth...", FontSize::Small, Rgb::ORANGE);
        }
        self.draw_status(display);
    }

    fn on_exit(&mut self) {
        self.save_cache();
        self.stop_engine();
        self.midi.disconnect();
        self.midi_port = None;
        info!("Synthesizer stopped");
    }
}
