//! Bounded retry with exponential backoff and jitter.
//!
//! A [`RetryPolicy`] wraps one fallible async operation. Every failed attempt
//! that will be retried produces a [`RetryAttempt`] record (also logged at
//! `warn` and counted in metrics); running out of attempts is reported as
//! [`RetryError::Exhausted`] instead of propagating the last error unchanged,
//! so callers can tell give-up apart from a permanent failure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::metrics;

/// Jitter strategy applied to the exponential delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jitter {
    /// Uniform random delay in `[0, cap]`.
    #[default]
    Full,
    /// Exactly the exponential cap.
    None,
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay cap before the second attempt, in milliseconds. Doubles per attempt.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default)]
    pub jitter: Jitter,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            jitter: Jitter::default(),
        }
    }
}

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// One backoff cycle: the attempt that failed and how long we waited after it.
#[derive(Debug, Clone, Serialize)]
pub struct RetryAttempt {
    /// 1-based number of the attempt that failed.
    pub attempt: u32,
    /// Display form of the triggering failure.
    pub error: String,
    /// Delay slept before the next attempt.
    #[serde(with = "duration_ms")]
    pub delay: Duration,
}

/// How a retried operation ultimately failed.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-transient error; no further attempts were made.
    Permanent { attempt: u32, error: E },
    /// Every attempt failed with a transient error.
    Exhausted { attempts: u32, last_error: E },
}

impl<E> RetryError<E> {
    pub fn error(&self) -> &E {
        match self {
            RetryError::Permanent { error, .. } => error,
            RetryError::Exhausted { last_error, .. } => last_error,
        }
    }

    pub fn into_error(self) -> E {
        match self {
            RetryError::Permanent { error, .. } => error,
            RetryError::Exhausted { last_error, .. } => last_error,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

impl<E: Display> Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Permanent { attempt, error } => {
                write!(f, "failed permanently on attempt {}: {}", attempt, error)
            }
            RetryError::Exhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {} attempts: {}", attempts, last_error),
        }
    }
}

/// Result of running an operation under a policy.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, RetryError<E>>,
    /// Attempts actually made.
    pub attempts: u32,
    /// One record per backoff, i.e. `attempts - 1` on eventual success.
    pub backoffs: Vec<RetryAttempt>,
}

/// Explicit retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Exponential cap for the delay following `attempt` (1-based).
    pub fn backoff_cap(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let exp_delay = self
            .config
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(exponent));
        Duration::from_millis(exp_delay.min(self.config.max_delay_ms))
    }

    /// Delay to sleep after `attempt` failed.
    pub fn delay_for<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let cap_ms = self.backoff_cap(attempt).as_millis() as u64;
        match self.config.jitter {
            Jitter::None => Duration::from_millis(cap_ms),
            Jitter::Full if cap_ms == 0 => Duration::ZERO,
            Jitter::Full => Duration::from_millis(rng.random_range(0..=cap_ms)),
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.max_attempts();
        let mut backoffs = Vec::new();
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                        backoffs,
                    };
                }
                Err(e) if !e.is_transient() => {
                    return RetryOutcome {
                        result: Err(RetryError::Permanent { attempt, error: e }),
                        attempts: attempt,
                        backoffs,
                    };
                }
                Err(e) if attempt >= max_attempts => {
                    error!(
                        operation = %operation,
                        attempts = attempt,
                        "Giving up after {} attempts: {}",
                        attempt,
                        e
                    );
                    metrics::RETRY_GIVE_UPS.with_label_values(&[operation]).inc();
                    return RetryOutcome {
                        result: Err(RetryError::Exhausted {
                            attempts: attempt,
                            last_error: e,
                        }),
                        attempts: attempt,
                        backoffs,
                    };
                }
                Err(e) => {
                    let delay = self.delay_for(attempt, &mut rand::rng());
                    warn!(
                        operation = %operation,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, retrying: {}",
                        e
                    );
                    metrics::RETRY_ATTEMPTS.with_label_values(&[operation]).inc();
                    backoffs.push(RetryAttempt {
                        attempt,
                        error: e.to_string(),
                        delay,
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (transient: {})", self.transient)
        }
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter: Jitter::Full,
        })
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 60_000);
        assert_eq!(config.jitter, Jitter::Full);
    }

    #[test]
    fn test_backoff_cap_doubles_and_caps() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 10,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
            jitter: Jitter::None,
        });
        assert_eq!(policy.backoff_cap(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff_cap(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff_cap(3), Duration::from_millis(4000));
        assert_eq!(policy.backoff_cap(4), Duration::from_millis(5000));
        assert_eq!(policy.backoff_cap(60), Duration::from_millis(5000));
    }

    #[test]
    fn test_full_jitter_stays_within_cap() {
        let policy = RetryPolicy::new(RetryConfig::default());
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 1..=5 {
            let cap = policy.backoff_cap(attempt);
            for _ in 0..200 {
                let delay = policy.delay_for(attempt, &mut rng);
                assert!(delay <= cap);
            }
        }
    }

    #[test]
    fn test_no_jitter_is_exact() {
        let policy = RetryPolicy::new(RetryConfig {
            jitter: Jitter::None,
            ..RetryConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.delay_for(2, &mut rng), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_success_after_two_transient_failures() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let outcome = policy
            .run("test_op", |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TestError { transient: true })
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(outcome.result.unwrap(), "done");
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.backoffs.len(), 2);
        assert_eq!(outcome.backoffs[0].attempt, 1);
        assert_eq!(outcome.backoffs[1].attempt, 2);
    }

    #[tokio::test]
    async fn test_exhaustion_is_bounded() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let outcome: RetryOutcome<(), TestError> = policy
            .run("test_op", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: true }) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.backoffs.len(), 2);
        let err = outcome.result.unwrap_err();
        assert!(err.is_exhausted());
        assert!(err.to_string().contains("gave up after 3 attempts"));
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let outcome: RetryOutcome<(), TestError> = policy
            .run("test_op", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: false }) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcome.backoffs.is_empty());
        assert!(matches!(
            outcome.result,
            Err(RetryError::Permanent { attempt: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_attempt_number_is_passed_through() {
        let policy = fast_policy(2);
        let mut seen = Vec::new();

        let _: RetryOutcome<(), TestError> = policy
            .run("test_op", |attempt| {
                seen.push(attempt);
                async { Err(TestError { transient: true }) }
            })
            .await;

        assert_eq!(seen, vec![1, 2]);
    }
}
