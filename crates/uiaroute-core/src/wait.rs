//! Deadline helpers.

use std::future::Future;
use std::time::Duration;

/// Runs `body` until it completes or `total` elapses.
///
/// On expiry `body` is dropped (abandoning whatever it was awaiting) and the
/// error built by `on_timeout` is returned.
pub async fn with_timeout<T, E, Fut, F>(total: Duration, on_timeout: F, body: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    F: FnOnce() -> E,
{
    match tokio::time::timeout(total, body).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}
