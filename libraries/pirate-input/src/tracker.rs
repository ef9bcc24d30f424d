//! Debounce and hold/repeat state machine
//!
//! Each button is sampled once per poll. A level change is accepted only if
//! the previous accepted transition of that button is at least the debounce
//! window old (lockout debouncing); contact bounce inside the window is
//! dropped. While a button stays down, hold events are scheduled at
//! `pressed_at + hold_threshold + k * repeat_interval` and emitted with their
//! scheduled timestamps, so a late poll still produces the right count.

use crate::config::InputConfig;
use pirate_core::{Button, ButtonEvent, ButtonEventKind};
use std::time::Duration;

/// State of a single button
#[derive(Debug, Clone)]
pub struct ButtonTracker {
    button: Button,
    pressed: bool,
    last_transition: Option<Duration>,
    next_hold: Option<Duration>,
}

impl ButtonTracker {
    /// Tracker for a released button
    pub fn new(button: Button) -> Self {
        Self {
            button,
            pressed: false,
            last_transition: None,
            next_hold: None,
        }
    }

    pub fn button(&self) -> Button {
        self.button
    }

    /// Debounced level
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed one raw sample taken at `now`
    ///
    /// Hold events that fell due before the sample are emitted first, then
    /// the transition (if any).
    pub fn sample(
        &mut self,
        level_pressed: bool,
        now: Duration,
        config: &InputConfig,
        out: &mut Vec<ButtonEvent>,
    ) {
        self.emit_due_holds(now, config, out);

        if level_pressed == self.pressed {
            return;
        }

        let settled = self
            .last_transition
            .map_or(true, |at| now.saturating_sub(at) >= config.debounce);
        if !settled {
            return;
        }

        self.pressed = level_pressed;
        self.last_transition = Some(now);

        if level_pressed {
            self.next_hold = Some(now + config.hold_threshold);
            out.push(ButtonEvent::new(self.button, ButtonEventKind::Pressed, now));
        } else {
            self.next_hold = None;
            out.push(ButtonEvent::new(self.button, ButtonEventKind::Released, now));
        }
    }

    fn emit_due_holds(&mut self, now: Duration, config: &InputConfig, out: &mut Vec<ButtonEvent>) {
        if !self.pressed {
            return;
        }
        let interval = config.repeat_interval.max(Duration::from_millis(1));
        while let Some(due) = self.next_hold {
            if due > now {
                break;
            }
            out.push(ButtonEvent::new(
                self.button,
                ButtonEventKind::HeldThresholdReached,
                due,
            ));
            self.next_hold = Some(due + interval);
        }
    }
}

/// Trackers for all four buttons
#[derive(Debug, Clone)]
pub struct InputTracker {
    config: InputConfig,
    buttons: [ButtonTracker; 4],
}

impl InputTracker {
    /// Create trackers with all buttons released
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            buttons: Button::ALL.map(ButtonTracker::new),
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Debounced level of `button`
    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons[button.index()].is_pressed()
    }

    /// Feed one sample per button, all taken at `now`
    ///
    /// `levels` is indexed like [`Button::ALL`]. Returned events are ordered
    /// by timestamp; events with equal timestamps keep button order.
    pub fn update(&mut self, levels: [bool; 4], now: Duration) -> Vec<ButtonEvent> {
        let mut events = Vec::new();
        for (tracker, level) in self.buttons.iter_mut().zip(levels) {
            tracker.sample(level, now, &self.config, &mut events);
        }
        events.sort_by_key(|event| event.timestamp);
        events
    }
}
