// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Linear, capped reconnect backoff.
//!
//! The n-th consecutive failure waits `min(base * n, max)`; a successful
//! connection resets the count.

use std::time::Duration;

/// Default delay unit between reconnect attempts.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5000);

/// Default upper bound on the reconnect delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(60_000);

/// Reconnect delay parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay added per consecutive failure.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy from millisecond values.
    pub fn from_millis(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        RetryPolicy {
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Delay before the retry following the `attempt`-th consecutive failure.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(attempt)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Consecutive-failure counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
}

impl RetryState {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of consecutive failures so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Records a failure and returns the delay before the next attempt.
    pub fn next_delay(&mut self, policy: &RetryPolicy) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        policy.delay_for(self.attempt)
    }

    /// Forgets previous failures.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
