//! Fixed-rate frame loop
//!
//! poll input → launcher frame (dispatch, render, present) → sleep until the
//! next frame boundary. A frame that overruns its budget does not cause a
//! burst of catch-up frames; the schedule restarts from the late frame.

use crate::app::AppFactory;
use crate::launcher::{Launcher, Mode};
use pirate_core::{DisplaySink, InputSource, PowerControl, Tick};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Time source of the frame loop
pub trait FrameClock {
    /// Time since the clock started
    fn now(&self) -> Duration;

    /// Block until `deadline`; returns immediately if it has passed
    fn sleep_until(&mut self, deadline: Duration);
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&mut self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
}

pub struct FrameLoop<C: FrameClock> {
    clock: C,
    period: Duration,
}

impl<C: FrameClock> FrameLoop<C> {
    pub fn new(clock: C, period: Duration) -> Self {
        Self {
            clock,
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run until the launcher reaches a terminal mode
    pub fn run<F: AppFactory, P: PowerControl>(
        &mut self,
        launcher: &mut Launcher<F, P>,
        input: &mut dyn InputSource,
        display: &mut dyn DisplaySink,
    ) -> Mode {
        self.run_frames(launcher, input, display, None)
    }

    /// Run at most `limit` frames (`None` = until a terminal mode)
    pub fn run_frames<F: AppFactory, P: PowerControl>(
        &mut self,
        launcher: &mut Launcher<F, P>,
        input: &mut dyn InputSource,
        display: &mut dyn DisplaySink,
        limit: Option<u64>,
    ) -> Mode {
        let start = self.clock.now();
        let mut tick = Tick {
            now: start,
            delta: Duration::ZERO,
            frame: 0,
        };
        let mut deadline = start;
        info!(period = ?self.period, "Frame loop started");

        loop {
            let events = input.poll();
            let mode = launcher.frame(&tick, events, display);
            if mode.is_terminal() {
                info!(mode = ?mode, frames = tick.frame + 1, "Frame loop finished");
                return mode;
            }
            if limit.is_some_and(|limit| tick.frame + 1 >= limit) {
                return mode;
            }

            deadline += self.period;
            let now = self.clock.now();
            if now > deadline {
                debug!(frame = tick.frame, overrun = ?(now - deadline), "Frame over budget");
                deadline = now;
            } else {
                self.clock.sleep_until(deadline);
            }
            tick = tick.next(self.clock.now());
        }
    }
}
