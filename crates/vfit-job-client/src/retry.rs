//! Bounded retry loop with a fixed inter-attempt delay.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{JobError, JobResult};

/// Attempt budget and inter-attempt delay for one `run_job` call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed sleep between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// States of the retry loop.
#[derive(Debug)]
enum RunState {
    Idle,
    Attempting(u32),
}

/// Terminal result of the retry loop, carrying the attempt count.
#[derive(Debug)]
pub enum RunOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { error: JobError, attempts: u32 },
}

/// Drive an operation through the retry loop.
///
/// The operation receives the 1-based attempt index. Non-retryable errors
/// terminate the loop immediately; retryable ones are re-attempted after the
/// fixed delay until the budget runs out. The last error is always carried
/// out, never discarded.
pub async fn drive<T, F, Fut>(policy: &RetryPolicy, operation: F) -> RunOutcome<T>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = JobResult<T>>,
{
    let budget = policy.max_attempts.max(1);
    let mut state = RunState::Idle;

    loop {
        state = match state {
            RunState::Idle => RunState::Attempting(1),
            RunState::Attempting(attempt) => match operation(attempt).await {
                Ok(value) => {
                    return RunOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    }
                }
                Err(error) if error.is_retryable() && attempt < budget => {
                    warn!(
                        "attempt {}/{} failed, retrying in {:?}: {}",
                        attempt, budget, policy.delay, error
                    );
                    tokio::time::sleep(policy.delay).await;
                    RunState::Attempting(attempt + 1)
                }
                Err(error) => {
                    return RunOutcome::Exhausted {
                        error,
                        attempts: attempt,
                    }
                }
            },
        };
    }
}
