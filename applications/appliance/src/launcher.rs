//! Launcher state machine
//!
//! ```text
//!            B on LaunchApp(id)               exit / fault
//!   Menu ───────────────────────▶ RunningApp(id) ─────────▶ Menu
//!    │  ▲                              │
//!    │  └── power action failed ◀──────┤ power request
//!    ▼                                 ▼
//!  Reboot / Shutdown (terminal) ◀──────┘
//! ```
//!
//! The launcher owns the only application handle. Faults inside an
//! application (errors from `update`, panics anywhere in its lifecycle) tear
//! the application down and return to the menu; they never reach the caller.

use crate::app::{AppFactory, AppRequest, Application, FrameEvent};
use crate::menu::{default_entries, draw_menu, draw_power_banner, MenuAction, MenuEntry};
use pirate_core::{
    AppId, Button, ButtonEvent, ButtonEventKind, DisplaySink, FontSize, PowerAction, PowerControl,
    Rgb, Tick, WrappingCursor,
};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a notice stays on the menu
const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Launcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Menu,
    RunningApp(AppId),
    /// Terminal: the system is shutting down
    Shutdown,
    /// Terminal: the system is rebooting
    Reboot,
}

impl Mode {
    pub fn is_terminal(self) -> bool {
        matches!(self, Mode::Shutdown | Mode::Reboot)
    }
}

/// Mode plus the menu cursor
///
/// The cursor is kept while an application runs, so returning to the menu
/// lands on the entry that launched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LauncherState {
    pub mode: Mode,
    selected: WrappingCursor,
}

impl LauncherState {
    pub fn selected_index(&self) -> usize {
        self.selected.index()
    }
}

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    color: Rgb,
    until: Duration,
}

pub struct Launcher<F: AppFactory, P: PowerControl> {
    entries: Vec<MenuEntry>,
    state: LauncherState,
    factory: F,
    power: P,
    app: Option<Box<dyn Application>>,
    notice: Option<Notice>,
    present_failing: bool,
}

impl<F: AppFactory, P: PowerControl> Launcher<F, P> {
    /// Launcher with the standard menu
    pub fn new(factory: F, power: P) -> Self {
        Self::with_entries(default_entries(), factory, power)
    }

    pub fn with_entries(entries: Vec<MenuEntry>, factory: F, power: P) -> Self {
        let selected = WrappingCursor::new(entries.len());
        Self {
            entries,
            state: LauncherState {
                mode: Mode::Menu,
                selected,
            },
            factory,
            power,
            app: None,
            notice: None,
            present_failing: false,
        }
    }

    pub fn state(&self) -> LauncherState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn selected_index(&self) -> usize {
        self.state.selected_index()
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    /// Text of the menu notice, if one is showing at `now`
    pub fn notice(&self, now: Duration) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| now < notice.until)
            .map(|notice| notice.text.as_str())
    }

    /// Run one frame: dispatch `input`, render and present
    ///
    /// Returns the mode after the frame. Once a terminal mode is reached,
    /// further calls do nothing.
    pub fn frame(&mut self, tick: &Tick, input: Vec<ButtonEvent>, display: &mut dyn DisplaySink) -> Mode {
        match self.state.mode {
            Mode::Menu => self.handle_menu(tick, &input, display),
            Mode::RunningApp(id) => self.run_app(id, tick, input, display),
            Mode::Shutdown | Mode::Reboot => return self.state.mode,
        }
        self.render(tick, display);
        self.state.mode
    }

    /// Tear down a running application without going through the menu
    ///
    /// Used when the process is asked to stop.
    pub fn shutdown_app(&mut self) {
        if self.app.is_some() {
            self.teardown();
        }
    }

    // ===== Menu =====

    fn handle_menu(&mut self, tick: &Tick, events: &[ButtonEvent], display: &mut dyn DisplaySink) {
        for event in events.iter().filter(|e| e.kind == ButtonEventKind::Pressed) {
            match event.button {
                Button::A => {
                    self.state.selected.previous();
                    debug!(selected = self.state.selected.index(), "Menu up");
                }
                Button::X => {
                    self.state.selected.next();
                    debug!(selected = self.state.selected.index(), "Menu down");
                }
                Button::B => {
                    let Some(entry) = self.entries.get(self.state.selected.index()).cloned() else {
                        continue;
                    };
                    info!(entry = %entry.label, "Menu entry selected");
                    self.activate(entry.action, tick, display);
                    // Anything after the selection belongs to the next mode's frame
                    break;
                }
                Button::Y => {}
            }
        }
    }

    fn activate(&mut self, action: MenuAction, tick: &Tick, display: &mut dyn DisplaySink) {
        if let Some(power) = action.power() {
            self.power_off(power, tick, display);
        } else if let MenuAction::LaunchApp(id) = action {
            self.launch(id, tick);
        }
    }

    // ===== Applications =====

    fn launch(&mut self, id: AppId, tick: &Tick) {
        info!(app = %id, "Launching application");

        let mut app = match self.factory.create(id) {
            Ok(app) => app,
            Err(e) => {
                error!(app = %id, error = %e, "Failed to construct application");
                self.notify(tick, format!("Can't start {}", id.label()), Rgb::RED);
                self.set_mode(Mode::Menu);
                return;
            }
        };

        let entered = catch_unwind(AssertUnwindSafe(|| app.on_enter(tick.now)));
        let failure = match entered {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };

        match failure {
            None => {
                self.app = Some(app);
                self.set_mode(Mode::RunningApp(id));
            }
            Some(reason) => {
                error!(app = %id, reason = %reason, "Application failed to start");
                exit_app(app);
                self.notify(tick, format!("Can't start {}", id.label()), Rgb::RED);
                self.set_mode(Mode::Menu);
            }
        }
    }

    fn run_app(&mut self, id: AppId, tick: &Tick, input: Vec<ButtonEvent>, display: &mut dyn DisplaySink) {
        let Some(app) = self.app.as_mut() else {
            warn!(app = %id, "No application handle, returning to menu");
            self.set_mode(Mode::Menu);
            return;
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut events = app.collect_events(tick);
            events.extend(input.into_iter().map(FrameEvent::Button));
            app.update(tick, &events)
        }));

        match outcome {
            Ok(Ok(request)) => self.handle_request(id, request, tick, display),
            Ok(Err(e)) => self.fault(id, &e.to_string(), tick),
            Err(payload) => self.fault(id, &panic_message(payload.as_ref()), tick),
        }
    }

    fn handle_request(&mut self, id: AppId, request: AppRequest, tick: &Tick, display: &mut dyn DisplaySink) {
        match request {
            AppRequest::Continue => {}
            AppRequest::ExitToMenu => {
                info!(app = %id, "Application requested exit to menu");
                self.teardown();
            }
            AppRequest::SwitchTo(next) => {
                info!(from = %id, to = %next, "Application requested switch");
                self.teardown();
                self.launch(next, tick);
            }
            AppRequest::Power(action) => {
                info!(app = %id, action = ?action, "Application requested power action");
                self.teardown();
                self.power_off(action, tick, display);
            }
        }
    }

    fn fault(&mut self, id: AppId, reason: &str, tick: &Tick) {
        error!(app = %id, reason = %reason, "Application fault, returning to menu");
        self.teardown();
        self.notify(tick, format!("{} stopped", id.label()), Rgb::RED);
    }

    fn teardown(&mut self) {
        if let Some(app) = self.app.take() {
            let id = app.id();
            exit_app(app);
            info!(app = %id, "Application exited");
        }
        self.set_mode(Mode::Menu);
    }

    // ===== Power =====

    fn power_off(&mut self, action: PowerAction, tick: &Tick, display: &mut dyn DisplaySink) {
        info!(action = ?action, "Starting power action");
        draw_power_banner(display, action);
        self.present(display);

        if action == PowerAction::Shutdown {
            if let Err(e) = display.set_backlight(false) {
                warn!(error = %e, "Failed to switch backlight off");
            }
        }

        match self.power.execute(action) {
            Ok(()) => self.set_mode(match action {
                PowerAction::Reboot => Mode::Reboot,
                PowerAction::Shutdown => Mode::Shutdown,
            }),
            Err(e) => {
                error!(action = ?action, error = %e, "Power action failed");
                if action == PowerAction::Shutdown {
                    if let Err(e) = display.set_backlight(true) {
                        warn!(error = %e, "Failed to switch backlight back on");
                    }
                }
                let text = match action {
                    PowerAction::Reboot => "Reboot failed!",
                    PowerAction::Shutdown => "Shutdown failed!",
                };
                self.notify(tick, text.to_string(), Rgb::RED);
                self.set_mode(Mode::Menu);
            }
        }
    }

    // ===== Rendering =====

    fn render(&mut self, tick: &Tick, display: &mut dyn DisplaySink) {
        match self.state.mode {
            Mode::Menu => self.draw_menu(tick, display),
            Mode::RunningApp(id) => {
                let drawn = match self.app.as_ref() {
                    Some(app) => catch_unwind(AssertUnwindSafe(|| app.render(tick, display))),
                    None => Ok(()),
                };
                if let Err(payload) = drawn {
                    self.fault(id, &panic_message(payload.as_ref()), tick);
                    self.draw_menu(tick, display);
                }
            }
            // The banner was presented before the power action ran
            Mode::Shutdown | Mode::Reboot => return,
        }
        self.present(display);
    }

    fn draw_menu(&self, tick: &Tick, display: &mut dyn DisplaySink) {
        draw_menu(display, &self.entries, &self.state.selected);
        if let Some(notice) = self.notice.as_ref().filter(|n| tick.now < n.until) {
            display.draw_text_centered(44, &notice.text, FontSize::Small, notice.color);
        }
    }

    fn present(&mut self, display: &mut dyn DisplaySink) {
        match display.present() {
            Ok(()) => {
                if self.present_failing {
                    info!("Display output recovered");
                    self.present_failing = false;
                }
            }
            Err(e) => {
                if !self.present_failing {
                    warn!(error = %e, "Failed to present frame");
                    self.present_failing = true;
                }
            }
        }
    }

    // ===== State =====

    fn notify(&mut self, tick: &Tick, text: String, color: Rgb) {
        self.notice = Some(Notice {
            text,
            color,
            until: tick.now + NOTICE_DURATION,
        });
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.state.mode != mode {
            info!(from = ?self.state.mode, to = ?mode, "Launcher state changed");
            self.state.mode = mode;
        }
    }
}

impl<F: AppFactory, P: PowerControl> Drop for Launcher<F, P> {
    fn drop(&mut self) {
        self.shutdown_app();
    }
}

/// Run `on_exit` and drop the application, containing any panic
fn exit_app(mut app: Box<dyn Application>) {
    let id = app.id();
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| app.on_exit())) {
        error!(app = %id, reason = %panic_message(payload.as_ref()), "Application panicked on exit");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}
