/// Program configuration
///
/// Three TOML files live in the configuration directory (the working
/// directory unless `--config-dir` is given). Each is layered with
/// environment variables (`PIRATE_LAUNCHER__FRAME__FPS=60`). Missing keys
/// take their defaults; out-of-range values are clamped. A file that cannot
/// be parsed is logged and replaced by the defaults.
use pirate_core::{PirateError, Result};
use pirate_input::{ButtonPins, InputConfig};
use pirate_playback::Volume;
use pirate_synth::Gain;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const LAUNCHER_FILE: &str = "launcher.toml";
pub const PLAYER_FILE: &str = "player.toml";
pub const SYNTH_FILE: &str = "synth.toml";

const LAUNCHER_ENV_PREFIX: &str = "PIRATE_LAUNCHER";
const PLAYER_ENV_PREFIX: &str = "PIRATE_PLAYER";
const SYNTH_ENV_PREFIX: &str = "PIRATE_SYNTH";
const ENV_SEPARATOR: &str = "__";

const MAX_FPS: u32 = 120;

// ===== Launcher =====

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LauncherConfig {
    #[serde(default = "default_display")]
    pub display: DisplaySettings,

    #[serde(default = "default_buttons")]
    pub buttons: ButtonSettings,

    #[serde(default = "default_frame")]
    pub frame: FrameSettings,

    #[serde(default = "default_power")]
    pub power: PowerSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplaySettings {
    #[serde(default = "default_display_device")]
    pub device: PathBuf,

    #[serde(default = "default_screen_size")]
    pub width: u32,

    #[serde(default = "default_screen_size")]
    pub height: u32,

    /// sysfs brightness file of the backlight, if it can be switched
    #[serde(default)]
    pub backlight: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ButtonSettings {
    #[serde(default = "default_pin_a")]
    pub a: u32,
    #[serde(default = "default_pin_b")]
    pub b: u32,
    #[serde(default = "default_pin_x")]
    pub x: u32,
    #[serde(default = "default_pin_y")]
    pub y: u32,

    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,

    #[serde(default = "default_repeat_ms")]
    pub repeat_ms: u64,
}

impl ButtonSettings {
    pub fn pins(&self) -> ButtonPins {
        ButtonPins {
            a: self.a,
            b: self.b,
            x: self.x,
            y: self.y,
        }
    }

    pub fn input_config(&self) -> InputConfig {
        InputConfig::from_millis(self.debounce_ms, self.hold_ms, self.repeat_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FrameSettings {
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl FrameSettings {
    /// Length of one frame
    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.fps.clamp(1, MAX_FPS)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PowerSettings {
    #[serde(default = "default_reboot_command")]
    pub reboot_command: Vec<String>,

    #[serde(default = "default_shutdown_command")]
    pub shutdown_command: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            display: default_display(),
            buttons: default_buttons(),
            frame: default_frame(),
            power: default_power(),
        }
    }
}

impl LauncherConfig {
    fn sanitized(mut self) -> Self {
        self.frame.fps = self.frame.fps.clamp(1, MAX_FPS);
        if self.display.width == 0 || self.display.height == 0 {
            warn!(
                width = self.display.width,
                height = self.display.height,
                "Invalid screen size, using 240x240"
            );
            self.display.width = default_screen_size();
            self.display.height = default_screen_size();
        }
        self
    }
}

// ===== Music player =====

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,

    /// Initial volume when no library cache exists yet (0.0-1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default = "default_player_library_file")]
    pub library_file: PathBuf,

    /// Album art size, following the launcher's display geometry
    #[serde(skip, default = "default_art_size")]
    pub art_size: (u32, u32),
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            music_dir: default_music_dir(),
            volume: default_volume(),
            library_file: default_player_library_file(),
            art_size: default_art_size(),
        }
    }
}

impl PlayerConfig {
    pub fn volume(&self) -> Volume {
        Volume::new(self.volume)
    }

    fn sanitized(mut self, root: &Path) -> Self {
        self.volume = Volume::new(self.volume).level();
        self.music_dir = expand_home(&self.music_dir);
        self.library_file = resolve(root, &self.library_file);
        self
    }
}

// ===== Synthesizer =====

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SynthConfig {
    #[serde(default = "default_soundfont_dir")]
    pub soundfont_dir: PathBuf,

    #[serde(default)]
    pub midi: MidiSettings,

    #[serde(default = "default_audio")]
    pub audio: AudioSettings,

    #[serde(default = "default_engine")]
    pub engine: EngineSettings,

    #[serde(default = "default_synth_library_file")]
    pub library_file: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MidiSettings {
    /// Input port index; `None` picks the first available keyboard
    #[serde(default)]
    pub device_id: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AudioSettings {
    #[serde(default = "default_gain")]
    pub gain: f32,

    #[serde(default = "default_max_gain")]
    pub max_gain: f32,
}

/// How the synthesis engine process is started
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_engine_program")]
    pub program: PathBuf,

    #[serde(default = "default_audio_driver")]
    pub audio_driver: String,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            soundfont_dir: default_soundfont_dir(),
            midi: MidiSettings::default(),
            audio: default_audio(),
            engine: default_engine(),
            library_file: default_synth_library_file(),
        }
    }
}

impl SynthConfig {
    pub fn gain(&self) -> Gain {
        Gain::new(self.audio.gain, self.audio.max_gain)
    }

    fn sanitized(mut self, root: &Path) -> Self {
        let gain = self.gain();
        self.audio = AudioSettings {
            gain: gain.value(),
            max_gain: gain.max(),
        };
        self.soundfont_dir = expand_home(&self.soundfont_dir);
        self.library_file = resolve(root, &self.library_file);
        self
    }
}

// ===== Loading =====

/// Directory the configuration files are read from
#[derive(Debug, Clone)]
pub struct ConfigDir {
    root: PathBuf,
    env: Option<config::Map<String, String>>,
}

impl ConfigDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            env: None,
        }
    }

    /// Read environment overrides from `vars` instead of the process environment
    pub fn with_env(mut self, vars: config::Map<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn launcher(&self) -> LauncherConfig {
        self.load_or_default::<LauncherConfig>(LAUNCHER_FILE, LAUNCHER_ENV_PREFIX)
            .sanitized()
    }

    pub fn player(&self) -> PlayerConfig {
        let display = self.launcher().display;
        PlayerConfig {
            art_size: (display.width, display.height),
            ..self
                .load_or_default::<PlayerConfig>(PLAYER_FILE, PLAYER_ENV_PREFIX)
                .sanitized(&self.root)
        }
    }

    pub fn synth(&self) -> SynthConfig {
        self.load_or_default::<SynthConfig>(SYNTH_FILE, SYNTH_ENV_PREFIX)
            .sanitized(&self.root)
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, file: &str, prefix: &str) -> T {
        match self.load(file, prefix) {
            Ok(value) => value,
            Err(e) => {
                warn!(file, error = %e, "Invalid configuration, using defaults");
                T::default()
            }
        }
    }

    /// Load one file layered with its environment overrides
    pub fn load<T: DeserializeOwned>(&self, file: &str, prefix: &str) -> Result<T> {
        let mut settings = config::Config::builder();

        let path = self.root.join(file);
        if path.exists() {
            debug!(path = %path.display(), "Reading configuration file");
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(self.env.clone()),
        );

        let config = settings
            .build()
            .map_err(|e| PirateError::config(format!("{file}: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| PirateError::config(format!("{file}: {e}")))
    }
}

/// Replace a leading `~/` with `$HOME`
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// Resolve `path` against the configuration directory
fn resolve(root: &Path, path: &Path) -> PathBuf {
    let path = expand_home(path);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

// Default values
fn default_display() -> DisplaySettings {
    DisplaySettings {
        device: default_display_device(),
        width: default_screen_size(),
        height: default_screen_size(),
        backlight: None,
    }
}

fn default_display_device() -> PathBuf {
    PathBuf::from("/dev/fb1")
}

fn default_screen_size() -> u32 {
    pirate_display::SCREEN_WIDTH
}

fn default_art_size() -> (u32, u32) {
    (pirate_display::SCREEN_WIDTH, pirate_display::SCREEN_HEIGHT)
}

fn default_buttons() -> ButtonSettings {
    let pins = ButtonPins::default();
    ButtonSettings {
        a: pins.a,
        b: pins.b,
        x: pins.x,
        y: pins.y,
        sysfs_root: default_sysfs_root(),
        debounce_ms: default_debounce_ms(),
        hold_ms: default_hold_ms(),
        repeat_ms: default_repeat_ms(),
    }
}

fn default_pin_a() -> u32 {
    ButtonPins::default().a
}

fn default_pin_b() -> u32 {
    ButtonPins::default().b
}

fn default_pin_x() -> u32 {
    ButtonPins::default().x
}

fn default_pin_y() -> u32 {
    ButtonPins::default().y
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_debounce_ms() -> u64 {
    pirate_input::DEFAULT_DEBOUNCE_MS
}

fn default_hold_ms() -> u64 {
    pirate_input::DEFAULT_HOLD_MS
}

fn default_repeat_ms() -> u64 {
    pirate_input::DEFAULT_REPEAT_MS
}

fn default_frame() -> FrameSettings {
    FrameSettings { fps: default_fps() }
}

fn default_fps() -> u32 {
    30
}

fn default_power() -> PowerSettings {
    PowerSettings {
        reboot_command: default_reboot_command(),
        shutdown_command: default_shutdown_command(),
    }
}

fn default_reboot_command() -> Vec<String> {
    vec!["sudo".to_string(), "reboot".to_string()]
}

fn default_shutdown_command() -> Vec<String> {
    vec!["sudo".to_string(), "poweroff".to_string()]
}

fn default_music_dir() -> PathBuf {
    PathBuf::from("~/Music")
}

fn default_volume() -> f32 {
    1.0
}

fn default_player_library_file() -> PathBuf {
    PathBuf::from("player_library.json")
}

fn default_soundfont_dir() -> PathBuf {
    PathBuf::from("~/SoundFonts")
}

fn default_audio() -> AudioSettings {
    AudioSettings {
        gain: default_gain(),
        max_gain: default_max_gain(),
    }
}

fn default_gain() -> f32 {
    pirate_synth::gain::DEFAULT_GAIN
}

fn default_max_gain() -> f32 {
    pirate_synth::gain::DEFAULT_MAX_GAIN
}

fn default_engine() -> EngineSettings {
    EngineSettings {
        program: default_engine_program(),
        audio_driver: default_audio_driver(),
    }
}

fn default_engine_program() -> PathBuf {
    PathBuf::from("fluidsynth")
}

fn default_audio_driver() -> String {
    "alsa".to_string()
}

fn default_synth_library_file() -> PathBuf {
    PathBuf::from("synth_library.json")
}
