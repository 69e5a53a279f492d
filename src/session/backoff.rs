//! Bounded exponential backoff with jitter
//!
//! Pure delay arithmetic plus a small retry counter. The generator never
//! sleeps; the connection retrier owns the actual suspension. Jitter widens
//! each delay into `[window, 2 * window)` so independent clients retrying
//! against the same broker do not synchronize.

use crate::engine::JitterSource;
use std::time::Duration;
use thiserror::Error;

/// Retry budget and delay bounds for one reconnect sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Base delay for the first retry window, in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound every computed delay is clamped to, in milliseconds
    pub max_delay_ms: u64,
    /// Total connect attempts allowed, counting the initial one
    pub max_attempts: u32,
}

/// Returned once the retry budget is consumed. No further state change
/// happens after this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("retry budget exhausted after {attempts} connect attempts")]
pub struct RetryExhausted {
    pub attempts: u32,
}

/// Mutable retry state for a single reconnect sequence.
///
/// Created fresh per sequence and discarded when the sequence ends, so no
/// attempt count ever leaks between sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts_made: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts_made: 0,
        }
    }

    /// Failed retries recorded so far
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Compute the delay before the next connect attempt.
    ///
    /// `max_attempts` counts total connect attempts, so at most
    /// `max_attempts - 1` delays are handed out before [`RetryExhausted`].
    pub fn next_backoff(
        &mut self,
        jitter: &mut (impl JitterSource + ?Sized),
    ) -> Result<Duration, RetryExhausted> {
        if self.attempts_made + 1 >= self.policy.max_attempts {
            return Err(RetryExhausted {
                attempts: self.policy.max_attempts,
            });
        }

        let window = self.window_ms();
        let drawn = window + u64::from(jitter.next_jitter()) % window.max(1);
        let delay_ms = drawn.min(self.policy.max_delay_ms);
        self.attempts_made += 1;
        Ok(Duration::from_millis(delay_ms))
    }

    /// Pre-jitter window base: `base * 2^attempts_made`, capped at the
    /// maximum delay
    fn window_ms(&self) -> u64 {
        let shift = self.attempts_made.min(63);
        self.policy
            .base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.policy.max_delay_ms)
    }
}
