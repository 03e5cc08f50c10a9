//! Bounded retry for setup operations.

use std::cell::Cell;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use backon::{ConstantBuilder, Retryable};

/// Run `op` up to `max_attempts` times, returning the first success or the
/// last failure. A budget of zero still makes one attempt.
///
/// `op` receives the 1-based attempt number. Attempts run back to back.
///
/// # Errors
///
/// Returns the error of the final attempt when every attempt failed.
pub async fn with_retry<T, F, Fut>(label: &str, max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let attempt = Cell::new(0u32);
    (|| {
        attempt.set(attempt.get() + 1);
        op(attempt.get())
    })
    .retry(
        ConstantBuilder::default()
            .with_delay(Duration::ZERO)
            .with_max_times(usize::try_from(max_attempts - 1).unwrap_or(usize::MAX)),
    )
    .notify(|e: &anyhow::Error, _| {
        tracing::warn!(
            attempt = attempt.get(),
            max_attempts,
            error = %format!("{e:#}"),
            "{label} failed, retrying"
        );
    })
    .await
}
