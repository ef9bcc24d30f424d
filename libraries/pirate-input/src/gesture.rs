//! Tap vs. hold interpretation
//!
//! A tap is a press released before the hold threshold. Once a hold event
//! has been seen, the release no longer counts as a tap.

use pirate_core::{Button, ButtonEvent, ButtonEventKind};

/// High-level button gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Button went down
    Press(Button),
    /// Button released before the hold threshold
    Tap(Button),
    /// Hold threshold reached (`first`) or another repeat interval elapsed
    Hold { button: Button, first: bool },
}

#[derive(Debug, Clone, Copy, Default)]
struct ButtonGesture {
    down: bool,
    holds: u32,
}

/// Per-button gesture state
///
/// Releases of buttons that went down before this tracker was created are
/// ignored, so a press that launched an application does not leak into it
/// as a tap.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    buttons: [ButtonGesture; 4],
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one event
    pub fn feed(&mut self, event: &ButtonEvent) -> Option<Gesture> {
        let state = &mut self.buttons[event.button.index()];
        match event.kind {
            ButtonEventKind::Pressed => {
                *state = ButtonGesture {
                    down: true,
                    holds: 0,
                };
                Some(Gesture::Press(event.button))
            }
            ButtonEventKind::HeldThresholdReached => {
                if !state.down {
                    return None;
                }
                state.holds += 1;
                Some(Gesture::Hold {
                    button: event.button,
                    first: state.holds == 1,
                })
            }
            ButtonEventKind::Released => {
                let tap = state.down && state.holds == 0;
                *state = ButtonGesture::default();
                tap.then_some(Gesture::Tap(event.button))
            }
        }
    }

    /// Interpret a batch of events in order
    pub fn feed_all<'a>(&mut self, events: impl IntoIterator<Item = &'a ButtonEvent>) -> Vec<Gesture> {
        events.into_iter().filter_map(|e| self.feed(e)).collect()
    }

    /// Forget all buttons
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(button: Button, kind: ButtonEventKind, at: u64) -> ButtonEvent {
        ButtonEvent::new(button, kind, Duration::from_millis(at))
    }

    #[test]
    fn press_release_is_tap() {
        let mut gestures = GestureTracker::new();
        let out = gestures.feed_all(&[
            event(Button::B, ButtonEventKind::Pressed, 0),
            event(Button::B, ButtonEventKind::Released, 120),
        ]);
        assert_eq!(out, vec![Gesture::Press(Button::B), Gesture::Tap(Button::B)]);
    }

    #[test]
    fn held_release_is_not_tap() {
        let mut gestures = GestureTracker::new();
        let out = gestures.feed_all(&[
            event(Button::X, ButtonEventKind::Pressed, 0),
            event(Button::X, ButtonEventKind::HeldThresholdReached, 600),
            event(Button::X, ButtonEventKind::HeldThresholdReached, 750),
            event(Button::X, ButtonEventKind::Released, 800),
        ]);
        assert_eq!(
            out,
            vec![
                Gesture::Press(Button::X),
                Gesture::Hold { button: Button::X, first: true },
                Gesture::Hold { button: Button::X, first: false },
            ]
        );
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut gestures = GestureTracker::new();
        let out = gestures.feed_all(&[
            event(Button::B, ButtonEventKind::HeldThresholdReached, 600),
            event(Button::B, ButtonEventKind::Released, 700),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn buttons_are_independent() {
        let mut gestures = GestureTracker::new();
        let out = gestures.feed_all(&[
            event(Button::A, ButtonEventKind::Pressed, 0),
            event(Button::Y, ButtonEventKind::Pressed, 10),
            event(Button::A, ButtonEventKind::HeldThresholdReached, 600),
            event(Button::Y, ButtonEventKind::Released, 610),
        ]);
        assert!(out.contains(&Gesture::Tap(Button::Y)));
        assert!(!out.contains(&Gesture::Tap(Button::A)));
    }
}
