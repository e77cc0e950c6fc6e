//! Exponential backoff policy.
//!
//! Pure timing math, separated from the calls it paces: the schedule is an
//! explicit attempt counter over a policy, so retry behavior is testable
//! without any I/O in the loop.

use std::time::Duration;

/// Exponential backoff: wait `base * multiplier^n` before retry `n`.
///
/// Defaults give the sequence 5s, 15s, 45s over three attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub multiplier: u32,
    /// Total attempts, including the first call.
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(5),
            multiplier: 3,
            max_attempts: 3,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, multiplier: u32, max_attempts: u32) -> Self {
        Self {
            base,
            multiplier,
            max_attempts,
        }
    }

    /// Wait before the retry that follows attempt `n` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(self.multiplier.saturating_pow(attempt))
    }

    pub fn schedule(&self) -> RetrySchedule {
        RetrySchedule {
            policy: *self,
            attempts: 0,
        }
    }
}

/// Attempt counter over a [`BackoffPolicy`].
///
/// Call [`RetrySchedule::next_delay`] after each failed attempt: it returns
/// the wait before the next try, or `None` once attempts are exhausted.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    policy: BackoffPolicy,
    attempts: u32,
}

impl RetrySchedule {
    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Retries taken so far (attempts beyond the first call).
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Record a failed attempt. Returns the wait before the next attempt,
    /// or `None` when the policy's attempt budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempts += 1;
        if self.attempts >= self.policy.max_attempts {
            None
        } else {
            Some(self.policy.delay_for(self.attempts - 1))
        }
    }
}

/// Classifies errors for retry drivers.
///
/// Transport failures and provider-side 5xx are retryable; rejections and
/// not-found are never retried automatically.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}
