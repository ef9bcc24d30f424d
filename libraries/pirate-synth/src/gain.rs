//! Synthesizer output gain

/// Default gain when nothing is configured
pub const DEFAULT_GAIN: f32 = 0.5;

/// Default upper limit for the gain
pub const DEFAULT_MAX_GAIN: f32 = 1.5;

/// Gain clamped to `0.0..=max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    value: f32,
    max: f32,
}

impl Gain {
    /// Create a gain, clamping `value` into `0.0..=max`
    ///
    /// A negative or non-finite `max` is treated as 0.0; a non-finite `value`
    /// falls back to [`DEFAULT_GAIN`] before clamping.
    pub fn new(value: f32, max: f32) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        let value = if value.is_finite() { value } else { DEFAULT_GAIN };
        Self {
            value: value.clamp(0.0, max),
            max,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Whole percent, truncated
    pub fn percent(&self) -> u32 {
        (self.value * 100.0 + 1e-4) as u32
    }

    /// Set a new value, clamped
    pub fn set(&mut self, value: f32) {
        *self = Self::new(value, self.max);
    }

    /// Change by `delta`, clamped; returns true if the value changed
    pub fn adjust(&mut self, delta: f32) -> bool {
        let before = self.value;
        self.set(self.value + delta);
        self.value != before
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(DEFAULT_GAIN, DEFAULT_MAX_GAIN)
    }
}
