//! Fixed-interval polling primitive.
//!
//! [`poll_with_delay`] runs a step at most `max_attempts` times, one at a
//! time, sleeping `interval` between steps. There is no backoff and no
//! jitter: a step either finishes the loop ([`ControlFlow::Break`]), asks for
//! another round ([`ControlFlow::Continue`]) or fails it (`Err`). No sleep
//! follows the final attempt.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::time::sleep;

/// Interval and budget of a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Why a poll loop stopped without a value.
#[derive(Debug, PartialEq, Eq)]
pub enum PollError<E> {
    /// Every attempt asked to continue.
    Exhausted { attempts: u32 },
    /// A step returned an error; no further attempt was made.
    Failed(E),
}

/// Run `step(attempt)` (1-indexed) until it breaks, fails or the budget runs out.
pub async fn poll_with_delay<T, E, F, Fut>(policy: PollPolicy, mut step: F) -> Result<T, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ControlFlow<T>, E>>,
{
    for attempt in 1..=policy.max_attempts {
        match step(attempt).await {
            Ok(ControlFlow::Break(value)) => return Ok(value),
            Ok(ControlFlow::Continue(())) => {}
            Err(e) => return Err(PollError::Failed(e)),
        }
        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }
    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}
