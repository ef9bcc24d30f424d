//! Polling input source

use crate::config::InputConfig;
use crate::gpio::PinReader;
use crate::tracker::InputTracker;
use pirate_core::{ButtonEvent, InputSource};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// [`InputSource`] that samples a [`PinReader`] on every poll
///
/// Event timestamps are measured from the moment the source was created.
pub struct ButtonInput<R: PinReader> {
    reader: R,
    tracker: InputTracker,
    origin: Instant,
    read_failing: bool,
}

impl<R: PinReader> ButtonInput<R> {
    pub fn new(reader: R, config: InputConfig) -> Self {
        Self {
            reader,
            tracker: InputTracker::new(config),
            origin: Instant::now(),
            read_failing: false,
        }
    }

    /// Sample the pins as if at `now` (time since creation)
    pub fn poll_at(&mut self, now: Duration) -> Vec<ButtonEvent> {
        let levels = match self.reader.read_levels() {
            Ok(levels) => {
                if self.read_failing {
                    warn!("GPIO reads recovered");
                    self.read_failing = false;
                }
                levels
            }
            Err(e) => {
                if !self.read_failing {
                    warn!(error = %e, "GPIO read failed, treating buttons as released");
                    self.read_failing = true;
                }
                [false; 4]
            }
        };

        let events = self.tracker.update(levels, now);
        for event in &events {
            trace!(button = %event.button, kind = ?event.kind, at = ?event.timestamp, "Button event");
        }
        events
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

impl<R: PinReader> InputSource for ButtonInput<R> {
    fn poll(&mut self) -> Vec<ButtonEvent> {
        let now = self.origin.elapsed();
        self.poll_at(now)
    }
}
