//! Pirate OS
//!
//! Boot-time launcher for a Raspberry Pi with a 240x240 button display HAT:
//! a main menu that starts the music player or the synthesizer, and can
//! reboot or power off the device.

pub mod app;
pub mod apps;
pub mod config;
pub mod hardware;
pub mod launcher;
pub mod menu;
pub mod runtime;
pub mod ui;

pub use app::{AppFactory, AppRequest, Application, FrameEvent};
pub use config::{ConfigDir, LauncherConfig, PlayerConfig, SynthConfig};
pub use launcher::{Launcher, LauncherState, Mode};
pub use menu::{MenuAction, MenuEntry};
pub use runtime::{FrameClock, FrameLoop, SystemClock};
