//! Delay policies for corrective resubmissions.
//!
//! The delay applies before a resubmission only. The first attempt of an
//! extraction is never delayed.

use std::time::Duration;

use rand::Rng;

const DEFAULT_MULTIPLIER: f64 = 2.0;
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// A resubmission delay policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    initial: Duration,
    multiplier: f64,
    max: Duration,
    jitter: bool,
}

impl Backoff {
    /// No delay between resubmissions.
    #[must_use]
    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// The same delay before every resubmission.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial: delay,
            multiplier: 1.0,
            max: delay,
            jitter: false,
        }
    }

    /// Exponentially growing delay, doubling each resubmission.
    #[must_use]
    pub fn exponential(initial: Duration) -> Self {
        Self {
            initial,
            multiplier: DEFAULT_MULTIPLIER,
            max: DEFAULT_MAX_DELAY,
            jitter: false,
        }
    }

    /// Override the growth factor.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Cap the delay.
    #[must_use]
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max = max;
        self
    }

    /// Randomize each delay to a factor in [0.5, 1.5) of its nominal value.
    #[must_use]
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// The delay before resubmission number `retry` (0-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry as i32);
        let nominal = self.initial.as_secs_f64() * factor;
        let capped = nominal.min(self.max.as_secs_f64());
        let final_secs = if self.jitter && capped > 0.0 {
            capped * rand::thread_rng().gen_range(0.5..1.5)
        } else {
            capped
        };
        Duration::from_secs_f64(final_secs.max(0.0))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::none()
    }
}
