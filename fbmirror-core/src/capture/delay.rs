//! Request-to-request pacing for the frame reader.
//!
//! The delay is a tier index between 0 (fast) and `max_tier` (normal).
//! Failures step it up one tier at a time; a good frame drops it back to
//! zero. Entering `max_tier` is reported to the caller exactly once per
//! climb so it can react (the coordinator nudges display brightness).

use std::time::Duration;

/// Tier layout for [`DelayState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayConfig {
    /// Delay at tier 0.
    pub min_delay: Duration,
    /// Added per tier.
    pub step: Duration,
    /// The "normal" tier; failures needed to get there from tier 0.
    pub max_tier: u32,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::ZERO,
            step: Duration::from_millis(40),
            max_tier: 5,
        }
    }
}

/// Adaptive pacing value.
#[derive(Debug, Clone)]
pub struct DelayState {
    tier: u32,
    config: DelayConfig,
}

impl DelayState {
    /// Start at tier 0. A `max_tier` of zero is raised to one.
    pub fn new(config: DelayConfig) -> Self {
        Self {
            tier: 0,
            config: DelayConfig {
                max_tier: config.max_tier.max(1),
                ..config
            },
        }
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    pub fn max_tier(&self) -> u32 {
        self.config.max_tier
    }

    /// Whether the normal (slowest) tier has been reached.
    pub fn is_normal(&self) -> bool {
        self.tier >= self.config.max_tier
    }

    /// Current delay before the next frame request.
    pub fn delay(&self) -> Duration {
        self.config.min_delay + self.config.step * self.tier
    }

    /// Step up one tier, clamped at the normal tier.
    ///
    /// Returns `true` only on the step that enters the normal tier.
    pub fn increase(&mut self) -> bool {
        if self.is_normal() {
            return false;
        }
        self.tier += 1;
        self.is_normal()
    }

    /// Back to tier 0.
    pub fn reset(&mut self) {
        self.tier = 0;
    }
}

impl Default for DelayState {
    fn default() -> Self {
        Self::new(DelayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_minimum() {
        let d = DelayState::default();
        assert_eq!(d.tier(), 0);
        assert_eq!(d.delay(), Duration::ZERO);
        assert!(!d.is_normal());
    }

    #[test]
    fn reaches_normal_after_exactly_max_tier_failures() {
        let mut d = DelayState::new(DelayConfig {
            max_tier: 4,
            ..Default::default()
        });
        let mut crossings = 0;
        let mut prev = d.tier();
        for n in 1..=20 {
            if d.increase() {
                crossings += 1;
                assert_eq!(n, 4, "crossing must happen on the 4th failure");
            }
            assert!(d.tier() >= prev);
            prev = d.tier();
        }
        assert_eq!(crossings, 1);
        assert_eq!(d.tier(), 4);
        assert!(d.is_normal());
    }

    #[test]
    fn reset_from_any_tier() {
        let mut d = DelayState::default();
        for climbed in 0..=d.max_tier() {
            for _ in 0..climbed {
                d.increase();
            }
            d.reset();
            assert_eq!(d.tier(), 0);
        }
    }

    #[test]
    fn crossing_fires_again_after_reset() {
        let mut d = DelayState::new(DelayConfig {
            max_tier: 2,
            ..Default::default()
        });
        assert!(!d.increase());
        assert!(d.increase());
        d.reset();
        assert!(!d.increase());
        assert!(d.increase());
    }

    #[test]
    fn delay_grows_linearly() {
        let mut d = DelayState::new(DelayConfig {
            min_delay: Duration::from_millis(10),
            step: Duration::from_millis(20),
            max_tier: 3,
        });
        d.increase();
        d.increase();
        assert_eq!(d.delay(), Duration::from_millis(50));
        d.increase();
        d.increase();
        assert_eq!(d.delay(), Duration::from_millis(70));
    }

    #[test]
    fn zero_max_tier_is_raised() {
        let mut d = DelayState::new(DelayConfig {
            max_tier: 0,
            ..Default::default()
        });
        assert_eq!(d.max_tier(), 1);
        assert!(d.increase());
    }
}
