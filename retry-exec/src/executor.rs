use core::future::Future;
use core::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::policy::{Attempt, RetryPolicy};

/// Terminal conditions other than a produced outcome.
///
/// A fixed schedule running out is *not* an error: the last outcome is
/// returned as `Ok` and the caller inspects it, matching the "give up after N
/// attempts, surface the last known outcome" contract.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed to produce an outcome at all. Propagated on the
    /// spot, bypassing the schedule; retrying is for failing outcomes, not
    /// for infrastructure faults.
    #[error("operation failed without producing an outcome: {source}")]
    Operation { source: E },

    /// The cancellation token fired at a suspension point.
    #[error("cancelled while waiting after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

/// Drives one operation through a [`RetryPolicy`].
///
/// The executor owns no mutable state across calls; it can be shared and
/// `execute` invoked any number of times, each call being one independent
/// execution. Waits suspend only the calling task, so concurrent executions
/// do not interfere.
///
/// # Example
///
/// ```ignore
/// let executor = RetryExecutor::new(RetryPolicy::fixed_backoff(Duration::from_secs(5), 5));
/// let status = executor
///     .execute(
///         || async { client.post(url).send().await.map(|r| r.status()) },
///         |status| !status.is_success(),
///         |attempt| warn!(status = %attempt.outcome, attempt.index, "retrying"),
///     )
///     .await?;
/// ```
#[derive(Debug)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    cancellation: Option<CancellationToken>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancellation: None,
        }
    }

    /// Installs a token observed at every suspension point. A token fired
    /// mid-wait aborts the execution without completing that wait. Unbounded
    /// schedules have no other way out of a permanently failing operation.
    #[must_use]
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self
        }
    }

    /// Invokes `operation` until `predicate` reports success (false), the
    /// schedule is exhausted, or the execution is cancelled.
    ///
    /// `on_retry` is called after each retryable failure with the failing
    /// outcome, the computed wait, and the 1-based attempt index. It is
    /// side-effect only and cannot alter control flow; pass `|_| {}` when
    /// uninterested.
    ///
    /// An `Err` from `operation` itself propagates immediately as
    /// [`RetryError::Operation`] without consulting the schedule.
    pub async fn execute<F, Fut, T, E, P, C>(
        &self,
        mut operation: F,
        mut predicate: P,
        mut on_retry: C,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&T) -> bool,
        C: FnMut(Attempt<'_, T>),
    {
        let mut attempt: u32 = 1;
        let mut outcome = operation()
            .await
            .map_err(|source| RetryError::Operation { source })?;
        loop {
            if !predicate(&outcome) {
                return Ok(outcome);
            }
            // The wait is computed only once the outcome is known retryable.
            let Some(wait) = self.policy.wait_before(attempt) else {
                warn!(
                    attempts = attempt,
                    "retry schedule exhausted, surfacing last failing outcome"
                );
                return Ok(outcome);
            };
            warn!(
                attempt,
                wait_ms = wait.as_millis() as u64,
                "outcome is retryable, waiting before next attempt"
            );
            on_retry(Attempt {
                index: attempt,
                outcome: &outcome,
                wait,
            });
            self.suspend(wait, attempt).await?;
            attempt += 1;
            outcome = operation()
                .await
                .map_err(|source| RetryError::Operation { source })?;
        }
    }

    async fn suspend<E>(&self, wait: Duration, attempts: u32) -> Result<(), RetryError<E>> {
        match &self.cancellation {
            None => tokio::time::sleep(wait).await,
            Some(token) => {
                tokio::select! {
                    // Cancellation wins when both are ready.
                    biased;
                    () = token.cancelled() => return Err(RetryError::Cancelled { attempts }),
                    () = tokio::time::sleep(wait) => {}
                }
            }
        }
        Ok(())
    }
}
