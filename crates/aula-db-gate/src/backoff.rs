use rand::Rng;
use std::time::Duration;

/// Exponential backoff with proportional jitter.
///
/// The delay before retry `k` (0-indexed) is `initial * multiplier^k`,
/// capped at `cap`, plus a random jitter drawn from
/// `[0, jitter * delay]`. The jittered value is clamped back to `cap`, so
/// for every attempt the delay stays within `[pre-jitter delay, cap]`.
/// Jitter is additive-only: concurrent callers spread out without any of
/// them retrying earlier than the schedule promises.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    multiplier: f64,
    cap: Duration,
    jitter: f64,
}

impl Backoff {
    /// Creates a backoff starting at `initial` with multiplier 2.0,
    /// a 5 second cap, and 25% jitter.
    pub fn new(initial: Duration) -> Self {
        Self {
            initial,
            multiplier: 2.0,
            cap: Duration::from_secs(5),
            jitter: 0.25,
        }
    }

    /// Sets the growth multiplier.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the delay ceiling.
    pub fn cap(mut self, cap: Duration) -> Self {
        self.cap = cap;
        self
    }

    /// Sets the jitter fraction, clamped to `0.0..=1.0`.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Pre-jitter delay for a retry attempt (0-indexed).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let secs = self.initial.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(secs.min(self.cap.as_secs_f64()))
    }

    /// Jittered delay for a retry attempt (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 {
            return base;
        }
        let spread = base.mul_f64(self.jitter * rand::rng().random_range(0.0..=1.0));
        (base + spread).min(self.cap)
    }
}
