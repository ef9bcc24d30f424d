//! Volume control with logarithmic scaling
//!
//! The player works with a linear 0.0..=1.0 level (shown as a percentage and
//! stepped by the volume buttons). The engine turns it into a gain with a dB
//! curve so equal steps sound roughly equal.

/// Levels are kept at whole-percent resolution
const RESOLUTION: f32 = 100.0;

/// Volume level with perceptual gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    /// Level (0.0-1.0)
    level: f32,
}

impl Volume {
    /// Create new volume, clamped to 0.0..=1.0
    ///
    /// Non-finite input maps to full volume.
    pub fn new(level: f32) -> Self {
        Self {
            level: Self::sanitize(level),
        }
    }

    /// Get current level (0.0-1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Level as a whole percentage
    pub fn percent(&self) -> u8 {
        (self.level * 100.0).round() as u8
    }

    /// Set level, clamped to 0.0..=1.0
    pub fn set_level(&mut self, level: f32) {
        self.level = Self::sanitize(level);
    }

    /// Change level by `delta`, clamped to 0.0..=1.0
    ///
    /// Returns true if the level changed.
    pub fn step(&mut self, delta: f32) -> bool {
        let before = self.level;
        self.set_level(self.level + delta);
        self.level != before
    }

    /// Linear gain multiplier for audio processing
    ///
    /// Formula: gain = 10^((level - 1) * 60 / 20)
    /// - 0.0 → silence
    /// - 0.5 → -30 dB → 0.0316
    /// - 1.0 →   0 dB → 1.0 (unity)
    pub fn gain(&self) -> f32 {
        if self.level <= 0.0 {
            return 0.0;
        }
        let db = (self.level - 1.0) * 60.0;
        10.0_f32.powf(db / 20.0)
    }

    fn sanitize(level: f32) -> f32 {
        if !level.is_finite() {
            return 1.0;
        }
        ((level * RESOLUTION).round() / RESOLUTION).clamp(0.0, 1.0)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(Volume::new(1.7).level(), 1.0);
        assert_eq!(Volume::new(-0.3).level(), 0.0);
        assert_eq!(Volume::new(f32::NAN).level(), 1.0);
    }

    #[test]
    fn fifty_steps_reach_full_volume_exactly() {
        let mut vol = Volume::new(0.0);
        for _ in 0..50 {
            vol.step(0.02);
        }
        assert_eq!(vol.level(), 1.0);
        assert!(!vol.step(0.02));
    }

    #[test]
    fn gain_calculation() {
        assert_eq!(Volume::new(0.0).gain(), 0.0);
        assert!((Volume::new(1.0).gain() - 1.0).abs() < 0.001);
        assert!((Volume::new(0.5).gain() - 0.0316).abs() < 0.001);
    }

    proptest! {
        #[test]
        fn steps_stay_in_range(deltas in prop::collection::vec(-0.1f32..0.1, 0..300)) {
            let mut vol = Volume::default();
            for delta in deltas {
                vol.step(delta);
                prop_assert!((0.0..=1.0).contains(&vol.level()));
                prop_assert!(vol.gain().is_finite());
            }
        }
    }
}
