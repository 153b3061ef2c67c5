// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Retry utilities with linear backoff for API calls.
///
/// Attempt `n` that ends with a retryable result waits `n * unit_delay` before
/// the next attempt, as long as that delay stays below the configured budget.
/// Once the budget is reached the last result is handed back to the caller
/// marked as exhausted instead of being silently treated as a success.
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Error;

/// Linear backoff configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct RetryPolicy
{
    unit_delay: Duration,
    budget:     Duration,
}

impl Default for RetryPolicy
{
    fn default() -> Self
    {
        Self::from_millis(300, 1000,)
    }
}

impl RetryPolicy
{
    /// Creates a policy from a unit delay and a budget.
    pub fn new(unit_delay: Duration, budget: Duration,) -> Self
    {
        Self {
            unit_delay, budget,
        }
    }

    /// Creates a policy from millisecond values.
    pub fn from_millis(unit_delay_ms: u64, budget_ms: u64,) -> Self
    {
        Self::new(Duration::from_millis(unit_delay_ms,), Duration::from_millis(budget_ms,),)
    }

    /// Base delay multiplied by the attempt number.
    pub fn unit_delay(&self,) -> Duration
    {
        self.unit_delay
    }

    /// Upper bound a single delay must stay below.
    pub fn budget(&self,) -> Duration
    {
        self.budget
    }

    /// Delay to wait after the failed attempt `attempt`, or `None` once the
    /// budget is exhausted.
    pub fn delay_after(&self, attempt: u32,) -> Option<Duration,>
    {
        let delay = self.unit_delay.checked_mul(attempt,)?;
        (delay < self.budget).then_some(delay,)
    }
}

/// Final state of a retried operation.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum RetryOutcome<T,>
{
    /// The operation produced a result that must not be retried.
    Settled
    {
        /// Final result.
        value:    T,
        /// Number of attempts made.
        attempts: u32,
    },
    /// Every attempt produced a retryable result and the budget ran out.
    Exhausted
    {
        /// Result of the last attempt.
        value:    T,
        /// Number of attempts made.
        attempts: u32,
    },
}

impl<T,> RetryOutcome<T,>
{
    /// Number of attempts made.
    pub fn attempts(&self,) -> u32
    {
        match self {
            Self::Settled {
                attempts, ..
            }
            | Self::Exhausted {
                attempts, ..
            } => *attempts,
        }
    }
}

/// Executes an async operation with linear backoff retry logic.
///
/// `should_retry` classifies every successful call; errors returned by the
/// operation itself are propagated immediately.
///
/// # Arguments
///
/// * `policy` - Backoff configuration
/// * `operation_name` - Name of the operation for logging
/// * `should_retry` - Whether a produced value warrants another attempt
/// * `f` - Async function to retry
///
/// # Errors
///
/// Returns the first error produced by `f`.
///
/// # Example
///
/// ```no_run
/// use langstat::{RetryOutcome, RetryPolicy, retry_linear};
///
/// # async fn example() -> Result<(), langstat::Error> {
/// let policy = RetryPolicy::from_millis(300, 1000,);
/// let outcome = retry_linear(&policy, "fetch status", |status: &u16| *status >= 500, || async {
///     Ok::<_, langstat::Error,>(200u16,)
/// },)
/// .await?;
/// assert!(matches!(outcome, RetryOutcome::Settled { value: 200, .. }));
/// # Ok(())
/// # }
/// ```
pub async fn retry_linear<F, Fut, T, P,>(
    policy: &RetryPolicy,
    operation_name: &str,
    should_retry: P,
    mut f: F,
) -> Result<RetryOutcome<T,>, Error,>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error,>,>,
    P: Fn(&T,) -> bool,
{
    let mut attempt = 1;

    loop {
        let value = f().await?;

        if !should_retry(&value,) {
            if attempt > 1 {
                debug!("{} settled on attempt {}", operation_name, attempt);
            }
            return Ok(RetryOutcome::Settled {
                value,
                attempts: attempt,
            },);
        }

        let Some(delay,) = policy.delay_after(attempt,) else {
            warn!("{} still failing after {} attempts, giving up", operation_name, attempt);
            return Ok(RetryOutcome::Exhausted {
                value,
                attempts: attempt,
            },);
        };

        warn!(
            "{} failed on attempt {}. Retrying in {}ms...",
            operation_name,
            attempt,
            delay.as_millis()
        );

        sleep(delay,).await;
        attempt += 1;
    }
}
