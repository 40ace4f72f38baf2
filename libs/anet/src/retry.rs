use std::fmt::Display;
use std::future::Future;

/// Run `operation` up to `attempts` times, returning the first success or the
/// last error. There is no backoff between attempts. `attempts` below 1 is
/// treated as 1.
///
/// Gateway calls are not idempotent: retrying a charge after a transport
/// failure can charge twice. Give each attempt its own `refId` and only retry
/// what is safe to repeat.
///
/// # Errors
/// Returns the error of the final attempt.
pub async fn retry<T, E, F, Fut>(attempts: u32, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_when(attempts, |_: &E| true, operation).await
}

/// [`retry`], but an error for which `retryable` returns `false` ends the loop
/// at once. Pair with [`RequestError::is_retryable`](crate::RequestError::is_retryable)
/// so gateway rejections are never repeated.
///
/// # Errors
/// Returns the first non-retryable error, or the error of the final attempt.
pub async fn retry_when<T, E, F, Fut, P>(
    attempts: u32,
    retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts && retryable(&err) => {
                tracing::debug!(attempt, attempts, error = %err, "attempt failed, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
