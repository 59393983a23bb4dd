// src/rabbitmq/backoff.rs
use std::fmt::Debug;
use std::time::Duration;

/// Decides how long the dial loop waits after its `attempt`-th failure
/// (counted from 1).
pub trait ReconnectPolicy: Send + Sync + Debug {
    fn delay(&self, attempt: u32) -> Duration;
}

impl ReconnectPolicy for Box<dyn ReconnectPolicy> {
    fn delay(&self, attempt: u32) -> Duration {
        (**self).delay(attempt)
    }
}

/// Same wait after every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

    pub fn new(interval: Duration) -> Self {
        FixedInterval { interval }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        FixedInterval::new(Self::DEFAULT_INTERVAL)
    }
}

impl ReconnectPolicy for FixedInterval {
    fn delay(&self, _attempt: u32) -> Duration {
        self.interval
    }
}

/// Doubling delay with jitter, capped at `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    jitter: f64,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        ExponentialBackoff {
            initial,
            max,
            jitter: 0.15,
        }
    }

    /// Fraction of the base delay added or removed at random, clamped to [0, 1].
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl ReconnectPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter == 0.0 {
            return base;
        }
        let spread = (rand::random::<f64>() * 2.0 - 1.0) * self.jitter;
        base.mul_f64(1.0 + spread)
    }
}
