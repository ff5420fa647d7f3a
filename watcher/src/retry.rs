//! Bounded retry with a fixed delay.
//!
//! A [`RetryPolicy`] runs any fallible async operation up to
//! [`MAX_ATTEMPTS`] times, sleeping a fixed delay between attempts. The
//! cancellation token is consulted before every attempt and raced against
//! both the attempt and the delay, so a shutdown never waits for a retry
//! budget to drain.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Attempt budget per operation.
pub const MAX_ATTEMPTS: u32 = 3;

/// Classifies errors that are worth another attempt.
pub trait RetryableError {
    fn is_retryable(&self) -> bool;
}

/// Outcome of a retried operation that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The cancellation token fired before the operation succeeded.
    #[error("operation cancelled")]
    Cancelled,
    /// Every attempt failed; `last` is the final error.
    #[error("giving up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    /// The operation failed with an error that must not be retried.
    #[error("non-retryable error: {0}")]
    Fatal(E),
}

/// Fixed-delay retry policy with a budget of [`MAX_ATTEMPTS`] attempts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn max_attempts(&self) -> u32 {
        MAX_ATTEMPTS
    }

    /// Runs `op` until it succeeds, the budget is exhausted, or `cancel`
    /// fires.
    ///
    /// `notify` is called with the 1-based attempt number after every failed
    /// attempt, before the next delay. Cancellation is never reported
    /// through `notify`.
    pub async fn run<T, E, F, Fut, N>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
        mut notify: N,
    ) -> Result<T, RetryError<E>>
    where
        E: RetryableError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        N: FnMut(u32, &E),
    {
        for attempt in 1..=MAX_ATTEMPTS {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                outcome = op() => outcome,
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }
            if !err.is_retryable() {
                return Err(RetryError::Fatal(err));
            }

            notify(attempt, &err);

            if attempt == MAX_ATTEMPTS {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        unreachable!("MAX_ATTEMPTS is non-zero")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky,
        Broken,
    }

    impl RetryableError for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Flaky)
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let mut notified = Vec::new();

        let result = fast()
            .run(
                &CancellationToken::new(),
                || async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TestError::Flaky)
                    } else {
                        Ok(42)
                    }
                },
                |attempt, _| notified.push(attempt),
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(notified, vec![1, 2]);
    }

    #[tokio::test]
    async fn exhausts_after_three_attempts() {
        let calls = &AtomicU32::new(0);
        let mut notified = 0;

        let result: Result<(), _> = fast()
            .run(
                &CancellationToken::new(),
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Flaky)
                },
                |_, _| notified += 1,
            )
            .await;

        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, MAX_ATTEMPTS);
                assert_eq!(last, TestError::Flaky);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(notified, 3);
    }

    #[tokio::test]
    async fn fatal_errors_stop_immediately() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = fast()
            .run(
                &CancellationToken::new(),
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Broken)
                },
                |_, _| panic!("fatal errors are not retried"),
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal(TestError::Broken))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_token_skips_the_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = &AtomicU32::new(0);

        let result: Result<(), RetryError<TestError>> = fast()
            .run(
                &cancel,
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Flaky)
                },
                |_, _| {},
            )
            .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_during_delay_aborts_without_exhausting() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(Duration::from_secs(3600));

        let trigger = cancel.clone();
        let result: Result<(), RetryError<TestError>> = policy
            .run(
                &cancel,
                || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(TestError::Flaky)
                    }
                },
                |_, _| trigger.cancel(),
            )
            .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
