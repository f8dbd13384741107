//! Exponential reconnect delays.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    /// Consecutive failed attempts allowed before giving up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            max: Duration::from_secs(10),
            multiplier: 2.0,
            max_attempts: 0,
        }
    }
}

/// Delay sequence `initial, initial * m, initial * m^2, ...` capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        let current = policy.initial.min(policy.max);
        Self {
            policy,
            attempt: 0,
            current,
        }
    }

    /// Delay before the next attempt, or `None` once the limit is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.policy.max_attempts > 0 && self.attempt >= self.policy.max_attempts {
            return None;
        }
        let delay = self.current;
        self.attempt += 1;
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.policy.multiplier)
            .unwrap_or(self.policy.max)
            .min(self.policy.max);
        Some(delay)
    }

    /// Start over after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.current = self.policy.initial.min(self.policy.max);
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
