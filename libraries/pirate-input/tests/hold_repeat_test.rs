//! Hold and repeat timing through the polling input source
//!
//! Drives `ButtonInput` with a scripted pin reader at a fixed frame period,
//! the way the runtime polls it.

use pirate_core::{Button, ButtonEvent, ButtonEventKind, InputSource, Result};
use pirate_input::{ButtonInput, InputConfig, PinReader};
use proptest::prelude::*;
use std::time::Duration;

// ===== Helpers =====

#[derive(Default)]
struct ScriptedPins {
    levels: [bool; 4],
    fail: bool,
}

impl PinReader for ScriptedPins {
    fn read_levels(&mut self) -> Result<[bool; 4]> {
        if self.fail {
            return Err(pirate_core::PirateError::device("line vanished"));
        }
        Ok(self.levels)
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Hold `button` from t=0 until the first frame at or after `release_at`
fn hold_for(button: Button, release_at: u64, frame: u64, config: InputConfig) -> Vec<ButtonEvent> {
    let mut input = ButtonInput::new(ScriptedPins::default(), config);
    let mut events = Vec::new();
    let mut t = 0;
    loop {
        let pressed = t < release_at;
        input.reader_mut().levels[button.index()] = pressed;
        events.extend(input.poll_at(ms(t)));
        if !pressed {
            break;
        }
        t += frame;
    }
    events
}

fn holds(events: &[ButtonEvent]) -> Vec<Duration> {
    events
        .iter()
        .filter(|e| e.kind == ButtonEventKind::HeldThresholdReached)
        .map(|e| e.timestamp)
        .collect()
}

// ===== Tests =====

#[test]
fn tap_shorter_than_threshold_has_no_hold() {
    let events = hold_for(Button::A, 300, 33, InputConfig::default());
    assert!(holds(&events).is_empty());
    assert_eq!(events.first().map(|e| e.kind), Some(ButtonEventKind::Pressed));
    assert_eq!(events.last().map(|e| e.kind), Some(ButtonEventKind::Released));
}

#[test]
fn two_second_hold_repeats_every_interval() {
    let events = hold_for(Button::X, 2000, 10, InputConfig::default());
    let expected: Vec<Duration> = (0..10).map(|k| ms(600 + 150 * k)).collect();
    assert_eq!(holds(&events), expected);
}

#[test]
fn read_failure_releases_buttons() {
    let mut input = ButtonInput::new(ScriptedPins::default(), InputConfig::default());
    input.reader_mut().levels = [false, true, false, false];
    input.poll_at(ms(0));
    input.reader_mut().fail = true;
    let events = input.poll_at(ms(100));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].button, Button::B);
    assert_eq!(events[0].kind, ButtonEventKind::Released);
}

#[test]
fn real_clock_poll_is_non_blocking() {
    let mut input = ButtonInput::new(ScriptedPins::default(), InputConfig::default());
    assert!(input.poll().is_empty());
}

// ===== Property Tests =====

proptest! {
    /// Property: holds start at the threshold and repeat at the interval until release
    #[test]
    fn hold_count_matches_duration(
        release_at in 60u64..4000,
        frame in 5u64..40,
        hold_ms in 200u64..900,
        repeat_ms in 50u64..300,
    ) {
        let config = InputConfig::from_millis(50, hold_ms, repeat_ms);
        let events = hold_for(Button::Y, release_at, frame, config);

        let released_at = events
            .iter()
            .find(|e| e.kind == ButtonEventKind::Released)
            .map(|e| e.timestamp.as_millis() as u64);
        prop_assert!(released_at.is_some());
        let released_at = released_at.unwrap_or_default();

        let expected: Vec<Duration> = if released_at < hold_ms {
            Vec::new()
        } else {
            (0..=(released_at - hold_ms) / repeat_ms)
                .map(|k| ms(hold_ms + k * repeat_ms))
                .collect()
        };
        prop_assert_eq!(holds(&events), expected);
    }

    /// Property: events come out in non-decreasing timestamp order
    #[test]
    fn events_are_time_ordered(
        script in prop::collection::vec(prop::array::uniform4(any::<bool>()), 1..120),
    ) {
        let mut input = ButtonInput::new(ScriptedPins::default(), InputConfig::default());
        let mut all = Vec::new();
        for (i, levels) in script.into_iter().enumerate() {
            input.reader_mut().levels = levels;
            all.extend(input.poll_at(ms(i as u64 * 33)));
        }
        prop_assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
