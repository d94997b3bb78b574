//! Retry loop: run a closure until success or policy says stop.

use std::fmt::Display;
use std::time::Duration;

use super::classify::Retryable;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the retry policy says to stop, sleeping the
/// current thread between attempts. `f` receives the 1-based attempt number.
pub fn run_with_retry<T, E, F>(policy: &RetryPolicy, f: F) -> Result<T, E>
where
    E: Retryable + Display,
    F: FnMut(u32) -> Result<T, E>,
{
    run_with_retry_using(policy, std::thread::sleep, f)
}

/// Like `run_with_retry` but with an injectable sleeper, so callers (and tests)
/// can observe or replace the backoff delays.
pub fn run_with_retry_using<T, E, F, S>(policy: &RetryPolicy, mut sleep: S, mut f: F) -> Result<T, E>
where
    E: Retryable + Display,
    F: FnMut(u32) -> Result<T, E>,
    S: FnMut(Duration),
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt, e.kind()) {
                RetryDecision::NoRetry => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "giving up after {} attempts: {}", attempt, e);
                    }
                    return Err(e);
                }
                RetryDecision::RetryAfter(d) => {
                    tracing::debug!(attempt, delay_ms = d.as_millis() as u64, "retrying: {}", e);
                    sleep(d);
                    attempt += 1;
                }
            },
        }
    }
}
