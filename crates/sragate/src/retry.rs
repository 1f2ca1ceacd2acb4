//! Retry with exponential backoff for code-host detail requests
//!
//! Only transport failures are retried. A server that answered with an error
//! status is taken at its word.

use crate::error::GatewayError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy applied to issue, pull request, commit and comment fetches
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: u32,
    /// Upper bound for the exponential part of the delay
    pub max_delay: Duration,
    /// Upper bound for the random jitter added to every delay
    pub max_jitter: Duration,
    /// Decides whether an error is worth another attempt
    pub retry_if: fn(&GatewayError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(60),
            max_jitter: Duration::from_secs(1),
            retry_if: GatewayError::is_transient,
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps long; meant for tests against local servers.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Exponential part of the delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    ///
    /// Exhaustion is reported as [`GatewayError::RetryExhausted`] wrapping
    /// the last transport error.
    pub async fn run<F, Fut, T>(&self, what: &str, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !(self.retry_if)(&err) => return Err(err),
                Err(err) if attempt >= attempts => {
                    warn!(target_url = what, attempts, error = %err, "Retries exhausted");
                    return Err(GatewayError::RetryExhausted {
                        attempts,
                        last_error: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.backoff(attempt - 1) + self.jitter();
                    warn!(
                        target_url = what,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(6), Duration::from_secs(60));
        assert_eq!(policy.backoff(40), Duration::from_secs(60));
    }

    #[test]
    fn test_jitter_bounded() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            assert!(policy.jitter() <= Duration::from_secs(1));
        }
        assert_eq!(RetryPolicy::immediate(3).jitter(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_eventual_success_after_transient_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);
        let result = policy
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(GatewayError::Timeout)
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);
        let result: Result<(), _> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GatewayError::Request("network down".to_string())) }
            })
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::RetryExhausted { attempts: 5, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_status_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);
        let result: Result<(), _> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(GatewayError::UpstreamStatus {
                        url: "u".to_string(),
                        status: 500,
                    })
                }
            })
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::UpstreamStatus { status: 500, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
