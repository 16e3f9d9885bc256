//! Retry timing for transient store and source failures.

use std::time::Duration;

use rand::Rng;

use crate::config::ProjectorConfig;

/// Doubling delays from `base` up to `max`, each stretched by up to a quarter at random
/// so parallel workers hitting the same store do not retry in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base: Duration,
    max: Duration,
}

impl RetryPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    pub fn from_config(config: &ProjectorConfig) -> Self {
        Self::new(
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_millis(config.backoff_max_ms),
        )
    }

    /// Delay before retry `attempt` (from zero), jitter excluded.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn start(&self) -> Retries {
        Retries {
            policy: *self,
            attempt: 0,
        }
    }
}

/// Progress of one failing operation through a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Retries {
    policy: RetryPolicy,
    attempt: u32,
}

impl Retries {
    pub fn next_delay(&mut self) -> Duration {
        let ceiling = self.policy.ceiling(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        let spread = (ceiling / 4).as_millis() as u64;
        if spread == 0 {
            return ceiling;
        }
        ceiling + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Called once the operation succeeds again.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
