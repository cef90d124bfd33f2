//! Exponential backoff state used by the connection manager.

use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::config::BackoffPolicy;

/// Tracks the reconnection delay and produces jittered sleeps.
///
/// The deterministic component starts at `policy.min`, doubles after every
/// failed attempt and never exceeds `policy.max`. Each sleep adds a uniform
/// jitter in `[0, current)`.
pub struct BackoffState {
    policy: BackoffPolicy,
    current: Duration,
    rng: StdRng,
}

impl BackoffState {
    /// Create a new state machine from the supplied policy.
    pub fn new(policy: BackoffPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }

    /// Create a state machine with a deterministic jitter source.
    pub fn with_seed(policy: BackoffPolicy, seed: u64) -> Self {
        Self::with_rng(policy, StdRng::seed_from_u64(seed))
    }

    fn with_rng(policy: BackoffPolicy, rng: StdRng) -> Self {
        Self {
            current: policy.min,
            policy,
            rng,
        }
    }

    /// Deterministic component of the next sleep.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Return to the minimum delay.
    pub fn reset(&mut self) {
        self.current = self.policy.min;
    }

    /// Sleep to apply after a failed attempt, advancing the delay.
    pub fn next_sleep(&mut self) -> Duration {
        let base_ms = self.current.as_millis().min(u128::from(u64::MAX)) as u64;
        let jitter_ms = match base_ms {
            0 => 0,
            _ => self.rng.gen_range(0..base_ms),
        };
        let sleep = Duration::from_millis(base_ms.saturating_add(jitter_ms));
        self.current = self.current.saturating_mul(2).min(self.policy.max);
        sleep
    }
}
