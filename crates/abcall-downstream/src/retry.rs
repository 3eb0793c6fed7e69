//! Bounded retry with exponential backoff for idempotent downstream calls.
//!
//! Retries only on transport errors (connection refused, DNS, timeout).
//! A response with any status code is returned as-is on the first attempt.

use std::time::Duration;

/// Base delay between retries (doubles each attempt: 100ms, 200ms, 400ms).
const BASE_DELAY_MS: u64 = 100;

/// Longest single wait between attempts.
const MAX_DELAY_MS: u64 = 30_000;

fn backoff(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(factor).min(MAX_DELAY_MS))
}

/// Send a request, retrying up to `retries` extra times on transport failure.
///
/// The closure `f` is called at most `retries + 1` times.
pub(crate) async fn retry_send<F, Fut>(
    retries: u32,
    endpoint: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..retries {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) => {
                let delay = backoff(attempt);
                tracing::warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_retries = retries,
                    "downstream request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    f().await
}
