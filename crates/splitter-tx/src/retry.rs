//! Fixed-delay retry wrapper for one-shot network operations.

use std::{fmt::Display, future::Future, time::Duration};

use thiserror::Error;

/// Attempt budget and delay used by [`FixedRetrier`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Fixed wait between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Returns a normalized policy with at least one attempt.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            attempts: self.attempts.max(1),
            delay: self.delay,
        }
    }
}

/// Terminal retrier failure.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the last failure.
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Label of the retried operation.
        operation: &'static str,
        /// Attempts made.
        attempts: u32,
        /// Error returned by the final attempt.
        last: E,
    },
    /// An attempt failed with an error that retrying cannot cure.
    #[error("{operation} failed permanently on attempt {attempt}: {error}")]
    Fatal {
        /// Label of the retried operation.
        operation: &'static str,
        /// Attempt that failed.
        attempt: u32,
        /// Error returned by that attempt.
        error: E,
    },
}

impl<E> RetryError<E> {
    /// Returns the error of the final attempt.
    #[must_use]
    pub fn into_last(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Fatal { error, .. } => error,
        }
    }
}

/// Retries an operation a bounded number of times with a constant delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRetrier {
    /// Attempt budget and delay.
    policy: RetryPolicy,
}

impl FixedRetrier {
    /// Creates a retrier with an explicit policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: policy.normalized(),
        }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Exhausted`] with the last failure once every attempt failed.
    pub async fn run<F, Fut, T, E>(
        &self,
        operation: &'static str,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_if(operation, op, |_| true).await
    }

    /// Like [`FixedRetrier::run`], but stops at the first error `retryable` rejects.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Fatal`] for a rejected error and [`RetryError::Exhausted`] once
    /// every attempt failed.
    pub async fn run_if<F, Fut, T, E, P>(
        &self,
        operation: &'static str,
        mut op: F,
        retryable: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let attempts = self.policy.attempts;
        let mut attempt = 1_u32;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation, attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if !retryable(&error) => {
                    tracing::error!(
                        operation,
                        attempt,
                        error = %error,
                        "operation failed permanently"
                    );
                    return Err(RetryError::Fatal {
                        operation,
                        attempt,
                        error,
                    });
                }
                Err(error) if attempt >= attempts => {
                    tracing::error!(operation, attempt, error = %error, "retry budget exhausted");
                    return Err(RetryError::Exhausted {
                        operation,
                        attempts: attempt,
                        last: error,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        attempts,
                        delay_ms = u64::try_from(self.policy.delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "operation failed; retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
