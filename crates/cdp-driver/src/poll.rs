use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::{CdpError, Result};

/// Run `check` every `interval` until it yields `Some`, or fail with
/// [`CdpError::Timeout`] once `timeout` has elapsed.
///
/// The check always runs at least once. Errors from the check abort the
/// wait immediately.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(CdpError::Timeout {
                what: what.to_string(),
                waited: timeout,
            });
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
