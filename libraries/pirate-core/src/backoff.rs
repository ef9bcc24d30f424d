//! Retry scheduling for devices that come and go

use std::time::Duration;

/// Exponential retry schedule
///
/// The first attempt is due immediately. Every failure pushes the next
/// attempt out by the current delay and doubles it up to `max`; a success
/// resets the delay to `initial`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    delay: Duration,
    next_attempt: Duration,
}

impl Backoff {
    /// Create a schedule starting at `initial`, capped at `max`
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            delay: initial,
            next_attempt: Duration::ZERO,
        }
    }

    /// Whether an attempt should be made at `now`
    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.next_attempt
    }

    /// Delay that will be applied after the next failure
    pub fn current_delay(&self) -> Duration {
        self.delay
    }

    /// Record a failed attempt made at `now`
    pub fn record_failure(&mut self, now: Duration) {
        self.next_attempt = now + self.delay;
        self.delay = (self.delay * 2).min(self.max);
    }

    /// Record a successful attempt made at `now`
    ///
    /// The next check is scheduled `initial` later.
    pub fn record_success(&mut self, now: Duration) {
        self.delay = self.initial;
        self.next_attempt = now + self.initial;
    }

    /// Make the next attempt due immediately
    pub fn reset(&mut self) {
        self.delay = self.initial;
        self.next_attempt = Duration::ZERO;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn first_attempt_is_immediate() {
        assert!(Backoff::default().is_due(Duration::ZERO));
    }

    #[test]
    fn failures_double_delay_up_to_cap() {
        let mut backoff = Backoff::default();
        let mut now = Duration::ZERO;
        let mut gaps = Vec::new();
        for _ in 0..6 {
            backoff.record_failure(now);
            let before = now;
            while !backoff.is_due(now) {
                now += Duration::from_millis(250);
            }
            gaps.push(now - before);
        }
        assert_eq!(gaps, vec![secs(1), secs(2), secs(4), secs(8), secs(8), secs(8)]);
    }

    #[test]
    fn success_resets_delay() {
        let mut backoff = Backoff::default();
        backoff.record_failure(secs(0));
        backoff.record_failure(secs(1));
        assert_eq!(backoff.current_delay(), secs(4));
        backoff.record_success(secs(3));
        assert_eq!(backoff.current_delay(), secs(1));
        assert!(!backoff.is_due(secs(3)));
        assert!(backoff.is_due(secs(4)));
    }
}
