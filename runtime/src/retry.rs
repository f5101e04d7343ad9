//! Retry logic with exponential backoff for asynchronous effects.
//!
//! Effect executors talk to collaborators that can fail transiently (a sync
//! endpoint that is briefly unreachable, for instance). These helpers retry
//! such work without ever surfacing into the reducer: the caller decides what
//! to log once the policy is exhausted.
//!
//! # Example
//!
//! ```rust
//! use mvu_runtime::retry::{RetryPolicy, retry_if};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::new()
//!     .with_max_retries(2)
//!     .with_initial_delay(Duration::from_millis(50));
//!
//! let value = retry_if(
//!     &policy,
//!     || async { Ok::<_, String>(42) },
//!     |error: &String| error.contains("unavailable"),
//! )
//! .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

/// Retry policy for handling transient failures
///
/// # Default Values
///
/// - `max_retries`: 3 (so at most 4 attempts)
/// - `initial_delay`: 100ms
/// - `max_delay`: 5 seconds
/// - `multiplier`: 2.0 (delay doubles each retry)
/// - `jitter`: enabled
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl RetryPolicy {
    /// Create a new retry policy with default settings
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: true,
        }
    }

    /// A policy that never retries
    #[must_use]
    pub const fn none() -> Self {
        Self::new().with_max_retries(0)
    }

    /// Set the number of retries after the first attempt
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the delay before the first retry
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the cap for exponential backoff
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Number of retries after the first attempt
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (0-indexed)
    ///
    /// `min(initial_delay * multiplier^retry, max_delay)`, scaled by a random
    /// factor in `0.5..=1.0` when jitter is enabled.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        use rand::Rng;

        #[allow(clippy::cast_possible_wrap)] // retry counts are tiny
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(retry as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        if self.jitter {
            Duration::from_secs_f64(capped * rand::thread_rng().gen_range(0.5..=1.0))
        } else {
            Duration::from_secs_f64(capped)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Retry an async operation while `is_retryable` accepts its error
///
/// # Returns
///
/// The first success, the first non-retryable error, or the last error once
/// the policy is exhausted.
///
/// # Errors
///
/// Returns the operation's error as described above.
pub async fn retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    tracing::info!(retries = retry, "Operation succeeded after retry");
                }
                return Ok(value);
            },
            Err(error) if !is_retryable(&error) => {
                tracing::debug!(error = %error, "Error is not retryable");
                return Err(error);
            },
            Err(error) if retry >= policy.max_retries => {
                tracing::warn!(retries = retry, error = %error, "Retries exhausted");
                return Err(error);
            },
            Err(error) => {
                let delay = policy.delay_for_retry(retry);
                metrics::counter!("effects.retry.attempt").increment(1);
                tracing::debug!(
                    retry,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "Operation failed, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            },
        }
    }
}

/// Retry an async operation on every error
///
/// # Errors
///
/// Returns the last error once the policy is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_if(policy, operation, |_| true).await
}
