//! Retry driver for provider calls.
//!
//! Wraps an async operation in a [`BackoffPolicy`] schedule: retryable
//! failures wait and go again, everything else surfaces immediately. The
//! result carries how many retries it took so callers can record that in
//! progress logs.

use std::fmt::Display;
use std::future::Future;

use gantry_core::backoff::{BackoffPolicy, Retryable};
use tracing::warn;

/// Successful result of a retried operation.
#[derive(Debug, Clone)]
pub struct Retried<T> {
    pub value: T,
    /// Attempts beyond the first call. Zero means it worked straight away.
    pub retries: u32,
}

/// Run `op` under `policy`. The closure receives the 0-indexed attempt
/// number, mostly for logging.
pub async fn run_with_retry<T, E, F, Fut>(policy: &BackoffPolicy, mut op: F) -> Result<Retried<T>, E>
where
    E: Retryable + Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut schedule = policy.schedule();
    loop {
        let attempt = schedule.attempts();
        match op(attempt).await {
            Ok(value) => {
                return Ok(Retried {
                    value,
                    retries: schedule.attempts(),
                });
            }
            Err(err) if err.is_retryable() => match schedule.next_delay() {
                Some(delay) => {
                    warn!(
                        attempt = attempt + 1,
                        wait_secs = delay.as_secs_f64(),
                        error = %err,
                        "provider call failed; will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(attempts = attempt + 1, error = %err, "retry budget exhausted");
                    return Err(err);
                }
            },
            Err(err) => return Err(err),
        }
    }
}
