//! Core domain types for Pirate OS

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ===== Input =====

/// One of the four buttons on the display HAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Button {
    /// Top-left
    A,
    /// Bottom-left
    B,
    /// Top-right
    X,
    /// Bottom-right
    Y,
}

impl Button {
    /// All buttons in polling order
    pub const ALL: [Button; 4] = [Button::A, Button::B, Button::X, Button::Y];

    /// Stable index in `ALL`
    pub fn index(self) -> usize {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::X => 2,
            Button::Y => 3,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
        };
        f.write_str(name)
    }
}

/// Kind of physical transition a button went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonEventKind {
    /// Button went down (after debouncing)
    Pressed,
    /// Button went up (after debouncing)
    Released,
    /// Button stayed down past the hold threshold, or another repeat interval elapsed
    HeldThresholdReached,
}

/// A single debounced button transition
///
/// `timestamp` is measured from the moment the input source was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub button: Button,
    pub kind: ButtonEventKind,
    pub timestamp: Duration,
}

impl ButtonEvent {
    /// Create a new button event
    pub fn new(button: Button, kind: ButtonEventKind, timestamp: Duration) -> Self {
        Self {
            button,
            kind,
            timestamp,
        }
    }

    /// True if this is a press of `button`
    pub fn is_press_of(&self, button: Button) -> bool {
        self.button == button && self.kind == ButtonEventKind::Pressed
    }
}

// ===== Applications and frames =====

/// Key of a launchable application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppId {
    /// MP3 player
    MusicPlayer,
    /// MIDI SoundFont synthesizer
    Synth,
}

impl AppId {
    /// Menu label
    pub fn label(self) -> &'static str {
        match self {
            AppId::MusicPlayer => "Music Player",
            AppId::Synth => "Synthesizer",
        }
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// System power action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerAction {
    Reboot,
    Shutdown,
}

impl PowerAction {
    /// Message shown on screen while the action is carried out
    pub fn banner(self) -> &'static str {
        match self {
            PowerAction::Reboot => "Rebooting...",
            PowerAction::Shutdown => "Shutting Down...",
        }
    }
}

/// Frame timing handed to applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    /// Time since the runtime started
    pub now: Duration,
    /// Time since the previous frame
    pub delta: Duration,
    /// Frame counter
    pub frame: u64,
}

impl Tick {
    /// Tick for the frame following this one at `now`
    pub fn next(self, now: Duration) -> Self {
        Self {
            now,
            delta: now.saturating_sub(self.now),
            frame: self.frame + 1,
        }
    }
}

// ===== Drawing =====

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const MAGENTA: Rgb = Rgb::new(255, 0, 255);
    pub const CYAN: Rgb = Rgb::new(0, 255, 255);
    pub const LIME: Rgb = Rgb::new(0, 255, 0);
    pub const ORANGE: Rgb = Rgb::new(255, 165, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const GRAY: Rgb = Rgb::new(128, 128, 128);
    pub const LIGHT_GRAY: Rgb = Rgb::new(200, 200, 200);
    pub const DARK_GRAY: Rgb = Rgb::new(40, 40, 40);

    /// Create a color from its components
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Blend towards black; `keep` is the fraction of the original (0..=255)
    pub fn darken(self, keep: u8) -> Self {
        let scale = |c: u8| ((u16::from(c) * u16::from(keep)) / 255) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Pixel position, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Monospace font sizes available on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontSize {
    /// 6x13 glyphs
    Small,
    /// 9x15 glyphs
    Medium,
    /// 10x20 glyphs
    Large,
}

impl FontSize {
    /// Glyph cell size in pixels (width, height)
    pub fn glyph_size(self) -> (u32, u32) {
        match self {
            FontSize::Small => (6, 13),
            FontSize::Medium => (9, 15),
            FontSize::Large => (10, 20),
        }
    }

    /// Rendered width of `text`
    pub fn text_width(self, text: &str) -> u32 {
        self.glyph_size().0 * text.chars().count() as u32
    }

    /// Line height
    pub fn line_height(self) -> u32 {
        self.glyph_size().1
    }
}

/// An owned RGB raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Bitmap {
    /// Create a bitmap from row-major pixels
    ///
    /// Returns `None` if `pixels` does not hold exactly `width * height` entries.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-color bitmap
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixels
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Pixel at (x, y), if inside the bitmap
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
    }

    /// Darken every pixel in place
    pub fn darken(&mut self, keep: u8) {
        for pixel in &mut self.pixels {
            *pixel = pixel.darken(keep);
        }
    }
}
