//! Exponential backoff schedule for readiness polling

use std::time::Duration;

/// Doubling delays, capped, with ±25% jitter
#[derive(Clone, Debug)]
pub struct Backoff {
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial.min(max),
            max,
        }
    }

    /// Next delay to sleep; advances the schedule
    pub fn next_delay(&mut self, rng: &mut fastrand::Rng) -> Duration {
        let base = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        jitter(base, rng)
    }
}

fn jitter(base: Duration, rng: &mut fastrand::Rng) -> Duration {
    let millis = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let spread = millis / 4;
    if spread == 0 {
        return base;
    }
    Duration::from_millis(rng.u64((millis - spread)..=millis.saturating_add(spread)))
}
