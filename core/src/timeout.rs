//! Deadline enforcement for in-flight requests.
//!
//! # Design
//! The guarded operation runs on its own tokio task and the caller races the
//! task's join handle against a timer. On expiry the caller gets
//! `ApiError::Timeout`; what happens to the operation depends on
//! [`CancellationMode`]. With `Detach` the task keeps running and its result
//! is dropped when it eventually settles, so a timed-out write may still take
//! effect on the server. `Abort` stops the task at its next suspension point.

use std::future::Future;
use std::time::Duration;

use crate::error::ApiError;

/// What happens to a request that loses the race against its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancellationMode {
    /// Keep the request running in the background and discard its result.
    #[default]
    Detach,
    /// Abort the request task.
    Abort,
}

/// Resolve with `operation`'s result if it settles within `deadline`,
/// otherwise fail with `ApiError::Timeout`.
pub async fn guard<F, T>(operation: F, deadline: Duration, mode: CancellationMode) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
    T: Send + 'static,
{
    let mut handle = tokio::spawn(operation);
    match tokio::time::timeout(deadline, &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ApiError::Transport(Box::new(join_err))),
        Err(_) => {
            if mode == CancellationMode::Abort {
                handle.abort();
            }
            tracing::debug!(
                deadline_ms = deadline.as_millis() as u64,
                ?mode,
                "request deadline elapsed"
            );
            Err(ApiError::Timeout { after: deadline })
        }
    }
}
