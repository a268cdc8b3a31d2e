//! retry
//!
//! Bounded-attempt retry for async operations, with linear backoff and
//! uniform jitter.
//!
//! # Backoff policy
//!
//! Despite the "exponential backoff" label this kind of tooling usually
//! wears, the schedule here is linear: the delay before attempt `k + 1` is
//!
//! ```text
//! base_delay * backoff_multiplier * k + U(0, jitter_ceiling)
//! ```
//!
//! where `k` counts completed attempts and the jitter term is uniform and
//! independent of `k`. The policy is named for what it does.
//!
//! # Retryability
//!
//! Every error is retryable. There is deliberately no error-kind filtering:
//! the operations wrapped here are short idempotent-enough API sequences
//! where another attempt is always acceptable.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::ui::output::{self, Verbosity};

/// Default delay scale: 5 seconds per completed attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);

/// Default ceiling of the uniform jitter term.
pub const DEFAULT_JITTER_CEILING: Duration = Duration::from_secs(1);

/// Jitter added on top of the linear backoff term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// No random component.
    None,
    /// Uniformly distributed in `[0, ceiling)`.
    Uniform(Duration),
}

/// Retry configuration for one supervised call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the initial try. Must be at least 1.
    pub max_attempts: u32,
    /// Linear delay scale.
    pub base_delay: Duration,
    /// Multiplier applied to the linear term. 1.0 reproduces the observed
    /// `base_delay * k` schedule.
    pub backoff_multiplier: f64,
    /// Random component added to every delay.
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: 1.0,
            jitter: Jitter::Uniform(DEFAULT_JITTER_CEILING),
        }
    }
}

impl RetryPolicy {
    /// Policy for a configured number of *additional* attempts beyond the
    /// first: `retries = 3` yields 4 total attempts.
    pub fn for_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Delay before the next attempt, after `completed_attempts` failures.
    pub fn backoff_delay(&self, completed_attempts: u32) -> Duration {
        let linear = self
            .base_delay
            .mul_f64(self.backoff_multiplier * completed_attempts as f64);
        linear + self.sample_jitter()
    }

    fn sample_jitter(&self) -> Duration {
        match self.jitter {
            Jitter::None => Duration::ZERO,
            Jitter::Uniform(ceiling) => {
                let ceiling_ms = ceiling.as_millis() as u64;
                if ceiling_ms == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::thread_rng().gen_range(0..ceiling_ms))
                }
            }
        }
    }
}

/// All attempts failed.
///
/// Wraps the last underlying error and reports the label and total attempt
/// count in its message.
#[derive(Debug, Error)]
#[error("{label} after {attempts} attempts: {source}")]
pub struct RetryExhausted<E>
where
    E: std::error::Error + 'static,
{
    /// What was being attempted (e.g. "Failed to commit and push changes").
    pub label: String,
    /// Total attempts made.
    pub attempts: u32,
    /// The error from the final attempt.
    #[source]
    pub source: E,
}

/// Attempt-level observability hook.
///
/// Implementations must not fail; they are told about each failed attempt
/// and each scheduled retry.
pub trait RetryObserver: Send + Sync {
    /// Attempt `attempt` (1-based) failed with `error`.
    fn attempt_failed(&self, attempt: u32, error: &dyn std::error::Error);

    /// A retry was scheduled: `remaining` attempts left after `delay`.
    fn retry_scheduled(&self, remaining: u32, delay: Duration);
}

/// Observer that reports through [`crate::ui::output`].
#[derive(Debug, Clone, Copy)]
pub struct ConsoleObserver {
    verbosity: Verbosity,
}

impl ConsoleObserver {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl RetryObserver for ConsoleObserver {
    fn attempt_failed(&self, attempt: u32, error: &dyn std::error::Error) {
        output::warn(
            format!("Attempt {} failed with error: {}", attempt, error),
            self.verbosity,
        );
    }

    fn retry_scheduled(&self, remaining: u32, _delay: Duration) {
        output::print(
            format!("Retrying... ({} attempt(s) remaining)", remaining),
            self.verbosity,
        );
    }
}

/// Run `operation` until it succeeds or `policy.max_attempts` attempts have
/// failed, sleeping the policy's backoff delay between attempts.
///
/// Attempt 1 is the initial try, not a retry. On success the result is
/// returned immediately with no trailing delay. On exhaustion the last
/// error is wrapped in [`RetryExhausted`] with `failure_label`.
pub async fn run_with_retry<T, E, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    failure_label: &str,
    observer: &dyn RetryObserver,
) -> Result<T, RetryExhausted<E>>
where
    E: std::error::Error + Send + Sync + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                observer.attempt_failed(attempt, &error);
                if attempt >= policy.max_attempts {
                    return Err(RetryExhausted {
                        label: failure_label.to_string(),
                        attempts: attempt,
                        source: error,
                    });
                }
                let remaining = policy.max_attempts - attempt;
                let delay = policy.backoff_delay(attempt);
                observer.retry_scheduled(remaining, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
