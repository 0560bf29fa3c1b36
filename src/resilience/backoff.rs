//! Exponential backoff with jitter for polling watchers.

use rand::Rng;
use std::time::Duration;

/// Ceiling on the delay, as a multiple of the base polling interval.
const MAX_MULTIPLIER: u32 = 16;

/// Calculate exponential backoff delay with jitter.
///
/// Attempt 0 is the regular interval; each consecutive failure doubles it up
/// to `max`.
pub fn calculate_backoff(failures: u32, base: Duration, max: Duration) -> Duration {
    let exponential = 2u32.saturating_pow(failures.min(16));
    let delay = base.saturating_mul(exponential).min(max);
    if failures == 0 {
        return delay;
    }

    // Jitter: 0 to 10% of the delay
    let jitter_range = delay.as_millis() as u64 / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    delay + Duration::from_millis(jitter)
}

/// Tracks consecutive poll failures and derives the next sleep.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    base: Duration,
    max: Duration,
    failures: u32,
}

impl PollBackoff {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            max: base.saturating_mul(MAX_MULTIPLIER),
            failures: 0,
        }
    }

    /// Delay before the next poll.
    pub fn delay(&self) -> Duration {
        calculate_backoff(self.failures, self.base, self.max)
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}
