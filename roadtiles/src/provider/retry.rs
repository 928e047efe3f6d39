//! Retry policy shared by every upstream client.
//!
//! All retrying operations use the same capped exponential backoff so that
//! worst-case failure latency is predictable: with the defaults, three
//! attempts wait 1 s and then 2 s between them.

use std::time::Duration;

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay after the first failed attempt (1 second).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Backoff ceiling (4 seconds).
pub const DEFAULT_MAX_DELAY_MS: u64 = 4000;

/// How an operation handles transient failures.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// Single attempt, no retries.
    None,

    /// Doubling delay between attempts, capped at `max_delay`.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay after the first failure.
        initial_delay: Duration,
        /// Delay never exceeds this.
        max_delay: Duration,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Exponential backoff with the default 1 s initial delay and 4 s cap.
    ///
    /// `max_attempts` below 1 is treated as 1.
    pub fn exponential(max_attempts: u32) -> Self {
        Self::ExponentialBackoff {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Returns `None` when no further attempt is allowed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
            } => {
                if attempt == 0 || attempt >= *max_attempts {
                    return None;
                }
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                let delay = initial_delay.saturating_mul(factor);
                Some(delay.min(*max_delay))
            }
        }
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        }
    }
}
