//! Retry policy for DeBank requests.
//!
//! Exponential backoff with bounded jitter, driven by an explicit attempt
//! counter so the ceiling and the delay sequence stay observable.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Default total number of attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on the computed (pre-jitter) backoff.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Upper bound on a server-provided `Retry-After` delay.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Retry ceiling and backoff constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed per request, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub base_delay: Duration,
    /// Cap applied to the exponential term.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Start a fresh backoff sequence for one request.
    pub fn backoff(&self) -> Backoff<'_> {
        Backoff { policy: self, retries: 0, last_delay: Duration::ZERO }
    }

    /// Exponential term for the given retry number (1-based), before jitter.
    fn exponential(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Backoff state for a single request.
///
/// Each computed delay is `exp + U(0, exp / 2)` and never shorter than the
/// previous computed delay.
#[derive(Debug)]
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    retries: u32,
    last_delay: Duration,
}

impl Backoff<'_> {
    /// Number of attempts issued so far, assuming the caller just made one.
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Delay before the next attempt, or `None` once the ceiling is reached.
    ///
    /// A `retry_after` hint from the server replaces the computed backoff.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if self.attempts() >= self.policy.max_attempts {
            debug!(attempts = self.attempts(), "Retry ceiling reached");
            return None;
        }
        self.retries += 1;

        if let Some(hint) = retry_after {
            return Some(hint.min(MAX_RETRY_AFTER));
        }

        let exp = self.policy.exponential(self.retries);
        let half_ms = u64::try_from(exp.as_millis() / 2).unwrap_or(u64::MAX);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=half_ms));
        let delay = (exp + jitter).max(self.last_delay);
        self.last_delay = delay;
        Some(delay)
    }
}

/// Parse a `Retry-After` header given in whole seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
