//! Retry utilities with exponential backoff and jitter.
//!
//! The readiness check polls the cluster until the deployed objects converge,
//! and transient API failures must not abort an install. This module provides
//! the general-purpose retry mechanism used for those polls, with exponential
//! backoff and jitter to avoid thundering herd problems.
//!
//! # Example
//!
//! ```ignore
//! use metacontroller_operator::retry::{retry_with_backoff, RetryConfig};
//!
//! let result = retry_with_backoff(
//!     &RetryConfig::with_deadline(Duration::from_secs(150)),
//!     "check_deployed_resources",
//!     || async { checker.check_all().await },
//! ).await?;
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{error, warn};

/// Configuration for operations that may fail transiently.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = unbounded)
    pub max_attempts: u32,
    /// Total deadline across all attempts (None = unbounded)
    pub deadline: Option<Duration>,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            deadline: None,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(15),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a config with a maximum number of attempts
    pub fn with_max_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            ..Default::default()
        }
    }

    /// Create a config bounded by a total deadline rather than attempt count
    ///
    /// This mirrors the install flow's behavior: keep checking until the
    /// deadline passes, then surface the last error.
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            ..Default::default()
        }
    }
}

/// Execute an async operation with exponential backoff and jitter.
///
/// Retries until success, until `max_attempts` is exhausted, or until the
/// total `deadline` passes, whichever comes first.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let mut attempt = 0u32;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let attempts_exhausted =
                    config.max_attempts > 0 && attempt >= config.max_attempts;
                let deadline_passed = config
                    .deadline
                    .map(|d| start.elapsed() >= d)
                    .unwrap_or(false);

                if attempts_exhausted || deadline_passed {
                    error!(
                        operation = %operation_name,
                        attempt = attempt,
                        elapsed = ?start.elapsed(),
                        error = %e,
                        "Operation failed after retries"
                    );
                    return Err(e);
                }

                // Add jitter: 0.5x to 1.5x of the delay
                let jitter = rand::thread_rng().gen_range(0.5..1.5);
                let jittered_delay = Duration::from_secs_f64(delay.as_secs_f64() * jitter);

                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = jittered_delay.as_millis(),
                    "Operation failed, retrying"
                );

                tokio::time::sleep(jittered_delay).await;

                // Exponential backoff, capped at max_delay
                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * config.backoff_multiplier)
                        .min(config.max_delay.as_secs_f64()),
                );
            }
        }
    }
}
