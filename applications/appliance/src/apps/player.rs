//! MP3 player
//!
//! Four views share one playback state:
//!
//! | view          | A tap     | X tap     | B tap          | Y tap        |
//! |---------------|-----------|-----------|----------------|--------------|
//! | Player        | prev song | next song | play / pause   | AlbumBrowser |
//! | AlbumBrowser  | up        | down      | play album     | SongBrowser  |
//! | SongBrowser   | up        | down      | play song      | Player       |
//! | SystemMenu    | up        | down      | run option     | Player       |
//!
//! Holding A / X changes the volume in every view; holding Y opens the
//! system menu.

use crate::app::{AppRequest, Application, FrameEvent};
use crate::config::PlayerConfig;
use crate::ui::{draw_header, draw_list, format_clock, truncate, ListStyle};
use pirate_core::{
    AppId, Backoff, Bitmap, Button, DisplaySink, FontSize, PirateError, Point, PowerAction, Result,
    Rgb, Tick, WrappingCursor,
};
use pirate_display::{ArtLoader, LoadedArt};
use pirate_input::{Gesture, GestureTracker};
use pirate_playback::{
    song_title, AudioEngine, EngineEvent, LastState, LibraryCache, MusicLibrary, PlaybackError,
    Volume,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Volume change per hold event
pub const VOLUME_STEP: f32 = 0.02;

/// How long the "Can't play" indicator stays up
const LOAD_ERROR_DURATION: Duration = Duration::from_secs(3);

/// Share of the background kept under the text overlay
const OVERLAY_KEEP: u8 = 105;

const HIGHLIGHT: Rgb = Rgb::CYAN;
const ALERT: Rgb = Rgb::new(255, 80, 80);
const MENU_BACKGROUND: Rgb = Rgb::new(40, 10, 10);

const BROWSER_STYLE: ListStyle = ListStyle {
    top: 40,
    row_height: 24,
    row_gap: 2,
    visible_rows: 6,
    max_chars: 18,
    font: FontSize::Medium,
    highlight: HIGHLIGHT,
    selected_text: Rgb::BLACK,
    text: Rgb::LIGHT_GRAY,
};

const SYSTEM_MENU_STYLE: ListStyle = ListStyle {
    top: 50,
    row_height: 30,
    row_gap: 5,
    visible_rows: 5,
    max_chars: 18,
    font: FontSize::Medium,
    highlight: ALERT,
    selected_text: Rgb::WHITE,
    text: Rgb::LIGHT_GRAY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerView {
    Player,
    AlbumBrowser,
    SongBrowser,
    SystemMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOption {
    Synthesizer,
    RebuildLibrary,
    Reboot,
    Shutdown,
    ExitToMenu,
}

impl SystemOption {
    pub const ALL: [SystemOption; 5] = [
        SystemOption::Synthesizer,
        SystemOption::RebuildLibrary,
        SystemOption::Reboot,
        SystemOption::Shutdown,
        SystemOption::ExitToMenu,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SystemOption::Synthesizer => "Synthesizer",
            SystemOption::RebuildLibrary => "Rebuild Library",
            SystemOption::Reboot => "Reboot",
            SystemOption::Shutdown => "Shutdown",
            SystemOption::ExitToMenu => "Exit to Menu",
        }
    }
}

pub struct MusicPlayerApp {
    config: PlayerConfig,
    engine: Box<dyn AudioEngine>,
    library: MusicLibrary,
    view: PlayerView,
    gestures: GestureTracker,

    // Playback
    album: usize,
    song: usize,
    loaded: bool,
    playing: bool,
    duration: Option<Duration>,
    position: Duration,
    volume: Volume,
    retry: Option<Backoff>,
    load_error_until: Option<Duration>,

    // Browsing
    album_cursor: WrappingCursor,
    song_cursor: WrappingCursor,
    menu_cursor: WrappingCursor,

    // Artwork
    art: Option<(usize, Bitmap)>,
    art_loader: ArtLoader,
    /// Album and file the art worker is decoding
    art_pending: Option<(usize, PathBuf)>,
    background: Rgb,
}

impl MusicPlayerApp {
    /// Create the player; fails if the music directory does not exist
    pub fn new(config: PlayerConfig, engine: Box<dyn AudioEngine>) -> Result<Self> {
        if !config.music_dir.is_dir() {
            return Err(PirateError::resource_load(
                config.music_dir.display().to_string(),
                "music directory not found",
            ));
        }
        let volume = config.volume();
        let art_loader = ArtLoader::spawn()?;
        Ok(Self {
            config,
            engine,
            library: MusicLibrary::default(),
            view: PlayerView::Player,
            gestures: GestureTracker::new(),
            album: 0,
            song: 0,
            loaded: false,
            playing: false,
            duration: None,
            position: Duration::ZERO,
            volume,
            retry: None,
            load_error_until: None,
            album_cursor: WrappingCursor::default(),
            song_cursor: WrappingCursor::default(),
            menu_cursor: WrappingCursor::new(SystemOption::ALL.len()),
            art: None,
            art_loader,
            art_pending: None,
            background: Rgb::DARK_GRAY,
        })
    }

    pub fn view(&self) -> PlayerView {
        self.view
    }

    pub fn library(&self) -> &MusicLibrary {
        &self.library
    }

    /// (album, song) of the current track
    pub fn current(&self) -> (usize, usize) {
        (self.album, self.song)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn album_cursor(&self) -> usize {
        self.album_cursor.index()
    }

    pub fn song_cursor(&self) -> usize {
        self.song_cursor.index()
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor.index()
    }

    /// True while the "Can't play" indicator is showing
    pub fn load_failed(&self, now: Duration) -> bool {
        self.load_error_until.is_some_and(|until| now < until)
    }

    // ===== Library =====

    /// Use the cache when it holds albums, otherwise scan and write it
    fn open_library(&mut self) -> Result<LastState> {
        let path = &self.config.library_file;
        match LibraryCache::load(path) {
            Ok(Some(cache)) if !cache.database.is_empty() => {
                info!(albums = cache.database.len(), "Library loaded from cache");
                self.library = cache.library();
                return Ok(cache.last_state);
            }
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Unreadable library cache, rescanning"),
        }

        self.scan_library()?;
        let state = LastState {
            volume: self.volume.level(),
            ..LastState::default()
        };
        self.write_cache(state);
        Ok(state)
    }

    fn scan_library(&mut self) -> Result<()> {
        self.library = MusicLibrary::scan(&self.config.music_dir)?;
        info!(
            albums = self.library.len(),
            dir = %self.config.music_dir.display(),
            "Music library scanned"
        );
        Ok(())
    }

    fn last_state(&self) -> LastState {
        LastState {
            album_index: self.album,
            song_index: self.song,
            volume: self.volume.level(),
        }
    }

    fn save_cache(&self) {
        self.write_cache(self.last_state());
    }

    fn write_cache(&self, state: LastState) {
        let cache = LibraryCache::new(&self.library, state);
        if let Err(e) = cache.save(&self.config.library_file) {
            warn!(path = %self.config.library_file.display(), error = %e, "Failed to save library cache");
        }
    }

    fn rebuild_library(&mut self, now: Duration) {
        info!("Rebuilding music library");
        self.engine.stop();
        self.loaded = false;
        self.playing = false;
        if let Err(e) = self.scan_library() {
            warn!(error = %e, "Library rescan failed");
            self.library = MusicLibrary::default();
        }
        self.album_cursor = WrappingCursor::new(self.library.len());
        self.art = None;
        self.art_pending = None;
        self.view = PlayerView::Player;
        if self.library.is_empty() {
            self.album = 0;
            self.song = 0;
            self.save_cache();
        } else {
            self.start_album(0, 0, now);
        }
    }

    // ===== Playback =====

    /// Load the current song; start it if `play`
    fn load_current(&mut self, now: Duration, play: bool) {
        let Some(path) = self.library.song(self.album, self.song).map(Path::to_path_buf) else {
            self.loaded = false;
            self.playing = false;
            return;
        };
        self.position = Duration::ZERO;
        self.refresh_artwork(&path);

        match self.engine.load(&path) {
            Ok(duration) => {
                debug!(path = %path.display(), ?duration, "Song loaded");
                self.duration = duration;
                self.loaded = true;
                self.retry = None;
                self.load_error_until = None;
                self.engine.set_volume(self.volume.level());
                if play {
                    self.engine.play();
                }
                self.playing = play;
            }
            Err(PlaybackError::Device(reason)) => {
                let backoff = self.retry.get_or_insert_with(Backoff::default);
                backoff.record_failure(now);
                warn!(reason = %reason, retry_in = ?backoff.current_delay(), "Audio device unavailable");
                self.loaded = false;
                self.playing = play;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Can't play song");
                self.retry = None;
                self.loaded = false;
                self.playing = false;
                self.duration = None;
                self.load_error_until = Some(now + LOAD_ERROR_DURATION);
            }
        }
    }

    fn start_album(&mut self, album: usize, song: usize, now: Duration) {
        if !self.library.contains(album, song) {
            return;
        }
        info!(album, song, "Starting playback");
        self.album = album;
        self.song = song;
        self.load_current(now, true);
        self.save_cache();
    }

    fn change_song(&mut self, forward: bool, keep_playing: bool, now: Duration) {
        let count = self.library.song_count(self.album);
        if count == 0 {
            return;
        }
        let mut cursor = WrappingCursor::at(self.song, count);
        if forward {
            cursor.next();
        } else {
            cursor.previous();
        }
        self.song = cursor.index();
        self.load_current(now, keep_playing);
        self.save_cache();
    }

    fn toggle_play(&mut self, now: Duration) {
        if self.library.is_empty() {
            return;
        }
        if !self.loaded {
            self.load_current(now, true);
            return;
        }
        if self.playing {
            self.engine.pause();
            self.playing = false;
        } else {
            self.engine.play();
            self.playing = true;
        }
        debug!(playing = self.playing, "Toggled playback");
    }

    fn change_volume(&mut self, delta: f32) {
        if self.volume.step(delta) {
            self.engine.set_volume(self.volume.level());
            debug!(volume = self.volume.percent(), "Volume changed");
        }
    }

    // ===== Artwork =====

    /// Ask the art worker for the current album's image
    ///
    /// The song's background color shows until the image arrives.
    fn refresh_artwork(&mut self, song: &Path) {
        self.background = background_for(song);

        let album = self.album;
        if self.art.as_ref().is_some_and(|(shown, _)| *shown == album)
            || self.art_pending.as_ref().is_some_and(|(pending, _)| *pending == album)
        {
            return;
        }
        self.art = None;
        self.art_pending = None;

        let Some(path) = self.library.album(album).and_then(|a| a.art.clone()) else {
            return;
        };
        let (width, height) = self.config.art_size;
        debug!(album, path = %path.display(), "Requesting album art");
        self.art_loader.request(album, &path, width, height);
        self.art_pending = Some((album, path));
    }

    fn receive_artwork(&mut self) {
        for LoadedArt { tag, path, bitmap } in self.art_loader.poll() {
            let expected = self
                .art_pending
                .as_ref()
                .is_some_and(|(album, pending)| *album == tag && *pending == path);
            if !expected {
                debug!(path = %path.display(), "Dropping stale album art");
                continue;
            }
            self.art_pending = None;
            match bitmap {
                Ok(mut bitmap) => {
                    bitmap.darken(OVERLAY_KEEP);
                    self.art = Some((tag, bitmap));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to load album art"),
            }
        }
    }

    /// Whether the current album's art is decoded and on screen
    pub fn has_artwork(&self) -> bool {
        self.art.as_ref().is_some_and(|(album, _)| *album == self.album)
    }

    // ===== Input =====

    fn handle_gesture(&mut self, gesture: Gesture, now: Duration) -> AppRequest {
        match gesture {
            Gesture::Hold { button: Button::A, .. } => self.change_volume(-VOLUME_STEP),
            Gesture::Hold { button: Button::X, .. } => self.change_volume(VOLUME_STEP),
            Gesture::Hold {
                button: Button::Y,
                first: true,
            } => {
                if self.view != PlayerView::SystemMenu {
                    self.view = PlayerView::SystemMenu;
                    self.menu_cursor = WrappingCursor::new(SystemOption::ALL.len());
                }
            }
            Gesture::Tap(button) => return self.handle_tap(button, now),
            Gesture::Hold { .. } | Gesture::Press(_) => {}
        }
        AppRequest::Continue
    }

    fn handle_tap(&mut self, button: Button, now: Duration) -> AppRequest {
        match (self.view, button) {
            (PlayerView::Player, Button::A) => self.change_song(false, self.playing, now),
            (PlayerView::Player, Button::X) => self.change_song(true, self.playing, now),
            (PlayerView::Player, Button::B) => self.toggle_play(now),
            (PlayerView::Player, Button::Y) => {
                self.album_cursor = WrappingCursor::at(self.album, self.library.len());
                self.view = PlayerView::AlbumBrowser;
            }

            (PlayerView::AlbumBrowser, Button::A) => self.album_cursor.previous(),
            (PlayerView::AlbumBrowser, Button::X) => self.album_cursor.next(),
            (PlayerView::AlbumBrowser, Button::B) => {
                self.start_album(self.album_cursor.index(), 0, now);
                self.view = PlayerView::Player;
            }
            (PlayerView::AlbumBrowser, Button::Y) => {
                let album = self.album_cursor.index();
                let count = self.library.song_count(album);
                self.song_cursor = if album == self.album {
                    WrappingCursor::at(self.song, count)
                } else {
                    WrappingCursor::new(count)
                };
                self.view = PlayerView::SongBrowser;
            }

            (PlayerView::SongBrowser, Button::A) => self.song_cursor.previous(),
            (PlayerView::SongBrowser, Button::X) => self.song_cursor.next(),
            (PlayerView::SongBrowser, Button::B) => {
                self.start_album(self.album_cursor.index(), self.song_cursor.index(), now);
                self.view = PlayerView::Player;
            }
            (PlayerView::SongBrowser | PlayerView::SystemMenu, Button::Y) => {
                self.view = PlayerView::Player;
            }

            (PlayerView::SystemMenu, Button::A) => self.menu_cursor.previous(),
            (PlayerView::SystemMenu, Button::X) => self.menu_cursor.next(),
            (PlayerView::SystemMenu, Button::B) => {
                let option = SystemOption::ALL[self.menu_cursor.index()];
                info!(option = option.label(), "System menu option selected");
                return self.run_option(option, now);
            }
        }
        AppRequest::Continue
    }

    fn run_option(&mut self, option: SystemOption, now: Duration) -> AppRequest {
        match option {
            SystemOption::Synthesizer => AppRequest::SwitchTo(AppId::Synth),
            SystemOption::RebuildLibrary => {
                self.rebuild_library(now);
                AppRequest::Continue
            }
            SystemOption::Reboot => AppRequest::Power(PowerAction::Reboot),
            SystemOption::Shutdown => AppRequest::Power(PowerAction::Shutdown),
            SystemOption::ExitToMenu => AppRequest::ExitToMenu,
        }
    }

    // ===== Drawing =====

    fn draw_player(&self, now: Duration, display: &mut dyn DisplaySink) {
        let (width, height) = display.size();

        let Some(album) = self.library.album(self.album) else {
            display.clear(Rgb::BLACK);
            display.draw_text(Point::new(10, 50), "No Music Found", FontSize::Medium, ALERT);
            display.draw_text(Point::new(10, 80), "Hold Y for options", FontSize::Small, Rgb::LIGHT_GRAY);
            return;
        };

        match &self.art {
            Some((_, bitmap)) => {
                display.clear(Rgb::BLACK);
                display.draw_image(Point::new(0, 0), bitmap);
            }
            None => display.clear(self.background.darken(OVERLAY_KEEP)),
        }

        let title = self
            .library
            .song(self.album, self.song)
            .map(song_title)
            .unwrap_or_else(|| "No Songs".to_string());
        display.draw_text_centered(80, &truncate(&title, 22), FontSize::Large, Rgb::WHITE);
        display.draw_text_centered(110, &truncate(&album.artist, 24), FontSize::Medium, Rgb::LIGHT_GRAY);

        let total = self.duration.unwrap_or_default();
        let clock = format!("{} / {}", format_clock(self.position), format_clock(total));
        display.draw_text_centered(140, &clock, FontSize::Small, Rgb::LIGHT_GRAY);

        let bar_width = width.saturating_sub(40);
        let bar_y = height as i32 - 30;
        display.fill_rect(Point::new(20, bar_y), bar_width, 2, Rgb::new(80, 80, 80));
        let progress = if total.is_zero() {
            0.0
        } else {
            (self.position.as_secs_f32() / total.as_secs_f32()).min(1.0)
        };
        let filled = (bar_width as f32 * progress) as u32;
        if filled > 0 {
            display.fill_rect(Point::new(20, bar_y), filled, 2, HIGHLIGHT);
        }

        draw_transport_icon(display, width as i32 / 2, self.playing);

        let volume = format!("Vol: {}%", self.volume.percent());
        display.draw_text(Point::new(width as i32 - 70, 5), &volume, FontSize::Small, Rgb::LIGHT_GRAY);

        if self.load_failed(now) {
            display.draw_text_centered(200, "Can't play", FontSize::Small, ALERT);
        } else if self.retry.is_some() {
            display.draw_text_centered(200, "Waiting for audio...", FontSize::Small, Rgb::ORANGE);
        }
    }

    fn draw_album_browser(&self, display: &mut dyn DisplaySink) {
        display.clear(Rgb::BLACK);
        draw_header(display, "Albums", FontSize::Large, HIGHLIGHT);
        let names: Vec<&str> = self.library.albums().iter().map(|a| a.name.as_str()).collect();
        draw_list(display, &names, &self.album_cursor, &BROWSER_STYLE);
    }

    fn draw_song_browser(&self, display: &mut dyn DisplaySink) {
        display.clear(Rgb::BLACK);
        let Some(album) = self.library.album(self.album_cursor.index()) else {
            draw_header(display, "Songs", FontSize::Medium, HIGHLIGHT);
            return;
        };
        draw_header(display, &truncate(&album.name, 15), FontSize::Medium, HIGHLIGHT);
        let titles: Vec<String> = album.songs.iter().map(|p| song_title(p)).collect();
        draw_list(display, &titles, &self.song_cursor, &BROWSER_STYLE);
    }

    fn draw_system_menu(&self, display: &mut dyn DisplaySink) {
        display.clear(MENU_BACKGROUND);
        draw_header(display, "System Menu", FontSize::Large, ALERT);
        let labels = SystemOption::ALL.map(SystemOption::label);
        draw_list(display, &labels, &self.menu_cursor, &SYSTEM_MENU_STYLE);
    }
}

impl Application for MusicPlayerApp {
    fn id(&self) -> AppId {
        AppId::MusicPlayer
    }

    fn on_enter(&mut self, now: Duration) -> Result<()> {
        let state = self.open_library()?;

        if self.library.contains(state.album_index, state.song_index) {
            self.album = state.album_index;
            self.song = state.song_index;
        } else {
            self.album = 0;
            self.song = 0;
        }
        self.volume = Volume::new(state.volume);
        self.album_cursor = WrappingCursor::at(self.album, self.library.len());
        self.gestures.reset();
        self.view = PlayerView::Player;

        info!(
            albums = self.library.len(),
            album = self.album,
            song = self.song,
            volume = self.volume.percent(),
            "Music player started"
        );
        self.load_current(now, false);
        Ok(())
    }

    fn collect_events(&mut self, _tick: &Tick) -> Vec<FrameEvent> {
        self.receive_artwork();
        self.engine
            .poll_events()
            .into_iter()
            .map(|event| match event {
                EngineEvent::TrackEnded => FrameEvent::TrackEnded,
                EngineEvent::Error(reason) => FrameEvent::EngineError(reason),
            })
            .collect()
    }

    fn update(&mut self, tick: &Tick, events: &[FrameEvent]) -> Result<AppRequest> {
        let now = tick.now;

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
                FrameEvent::TrackEnded => {
                    debug!(album = self.album, song = self.song, "Track ended");
                    self.change_song(true, true, now);
                }
                FrameEvent::EngineError(reason) => {
                    warn!(reason = %reason, "Playback error");
                    self.playing = false;
                }
                FrameEvent::Midi(_) => {}
            }
        }

        if self.retry.as_ref().is_some_and(|backoff| backoff.is_due(now)) {
            debug!("Retrying audio device");
            self.load_current(now, self.playing);
        }

        self.position = self.engine.position();
        Ok(AppRequest::Continue)
    }

    fn render(&self, tick: &Tick, display: &mut dyn DisplaySink) {
        match self.view {
            PlayerView::Player => self.draw_player(tick.now, display),
            PlayerView::AlbumBrowser => self.draw_album_browser(display),
            PlayerView::SongBrowser => self.draw_song_browser(display),
            PlayerView::SystemMenu => self.draw_system_menu(display),
        }
    }

    fn on_exit(&mut self) {
        self.engine.stop();
        self.playing = false;
        self.loaded = false;
        self.save_cache();
        info!("Music player stopped");
    }
}

/// Stable background color for songs without album art
fn background_for(song: &Path) -> Rgb {
    let mut hasher = DefaultHasher::new();
    song.hash(&mut hasher);
    let hash = hasher.finish();
    let channel = |shift: u32| 50 + ((hash >> shift) % 206) as u8;
    Rgb::new(channel(0), channel(16), channel(32))
}

/// Pause bars while playing, a play triangle while paused
fn draw_transport_icon(display: &mut dyn DisplaySink, center_x: i32, playing: bool) {
    if playing {
        display.fill_rect(Point::new(center_x - 10, 170), 6, 21, Rgb::WHITE);
        display.fill_rect(Point::new(center_x + 5, 170), 6, 21, Rgb::WHITE);
    } else {
        for row in 0..=20 {
            let width = 15 - (row - 10i32).abs() * 3 / 2;
            display.fill_rect(Point::new(center_x - 5, 170 + row), width.max(1) as u32, 1, Rgb::WHITE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn background_is_stable_and_bright_enough() {
        let song = PathBuf::from("/music/Album/01 - Intro.mp3");
        let first = background_for(&song);
        assert_eq!(first, background_for(&song));
        for c in [first.r, first.g, first.b] {
            assert!(c >= 50);
        }
    }

    #[test]
    fn system_options_in_menu_order() {
        let labels: Vec<_> = SystemOption::ALL.iter().map(|o| o.label()).collect();
        assert_eq!(
            labels,
            ["Synthesizer", "Rebuild Library", "Reboot", "Shutdown", "Exit to Menu"]
        );
    }

    #[test]
    fn missing_music_dir_is_a_resource_error() {
        let config = PlayerConfig {
            music_dir: PathBuf::from("/definitely/not/here"),
            ..PlayerConfig::default()
        };
        let err = MusicPlayerApp::new(config, Box::new(SilentEngine)).err().unwrap();
        assert!(matches!(err, PirateError::ResourceLoad { .. }));
    }

    struct SilentEngine;

    impl AudioEngine for SilentEngine {
        fn load(&mut self, _path: &Path) -> pirate_playback::Result<Option<Duration>> {
            Ok(None)
        }
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn stop(&mut self) {}
        fn set_volume(&mut self, _level: f32) {}
        fn position(&self) -> Duration {
            Duration::ZERO
        }
        fn is_playing(&self) -> bool {
            false
        }
        fn poll_events(&mut self) -> Vec<EngineEvent> {
            Vec::new()
        }
    }
}
