//! Scheduler-level retry policy.
//!
//! A failed run is retried as a whole; the pipeline itself never retries.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// How often and how patiently a failed run is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl RetryConfig {
    /// `max_retries` further attempts, each after `delay`.
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self { max_retries, delay }
    }

    /// Run `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or the retries are spent. Returns the last result.
    pub async fn run<T, E, F, Fut, R>(&self, mut operation: F, is_retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_retries && is_retryable(&error) => {
                    let delay = self.delay;
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_secs = delay.as_secs_f64(),
                        cause = %error,
                        "run failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn retries_transient_failures_up_to_the_limit() {
        let calls = Cell::new(0);
        let config = RetryConfig::fixed(Duration::ZERO, 2);

        let result: Result<(), String> = config
            .run(
                || {
                    calls.set(calls.get() + 1);
                    async { Err(String::from("transient")) }
                },
                |_| true,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let calls = Cell::new(0);
        let config = RetryConfig::fixed(Duration::ZERO, 5);

        let result: Result<(), String> = config
            .run(
                || {
                    calls.set(calls.get() + 1);
                    async { Err(String::from("permanent")) }
                },
                |_| false,
            )
            .await;

        assert_eq!(result, Err(String::from("permanent")));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn success_after_a_retry_is_returned() {
        let calls = Cell::new(0);
        let config = RetryConfig::fixed(Duration::ZERO, 1);

        let result = config
            .run(
                || {
                    calls.set(calls.get() + 1);
                    let attempt = calls.get();
                    async move {
                        if attempt == 1 {
                            Err(String::from("flaky"))
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(2));
    }
}
