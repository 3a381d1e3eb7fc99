//! Execution strategies
//!
//! Three interchangeable algorithms with one contract: consume the batch,
//! emit exactly one outcome per request id into the outcome channel, catch
//! per-request errors locally.

pub(crate) mod bounded;
pub(crate) mod native_batch;
pub(crate) mod synchronous;

use contracts::{ApiClient, ApiRequest, FailureKind, Outcome, RetryConfig};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Send one request, applying the opt-in retry policy, and always produce
/// an outcome. Cancellation aborts the backoff wait, not the in-flight
/// call.
pub(crate) async fn execute_single<C: ApiClient + Sync>(
    client: &C,
    request: &ApiRequest,
    retry: RetryConfig,
    cancel: &CancellationToken,
) -> Outcome {
    let mut attempt: u32 = 0;
    loop {
        match client.send_one(request).await {
            Ok(response) => return Outcome::success(request.custom_id.clone(), response),
            Err(e) => {
                if attempt >= retry.max_attempts || cancel.is_cancelled() {
                    return Outcome::failure(
                        request.custom_id.clone(),
                        FailureKind::Request,
                        e.to_string(),
                    );
                }

                attempt += 1;
                warn!(
                    custom_id = %request.custom_id,
                    attempt,
                    max_attempts = retry.max_attempts,
                    error = %e,
                    "request failed, retrying after backoff"
                );

                let aborted = tokio::select! {
                    _ = cancel.cancelled() => true,
                    _ = sleep(Duration::from_secs(retry.backoff_secs)) => false,
                };
                if aborted {
                    return Outcome::failure(
                        request.custom_id.clone(),
                        FailureKind::Request,
                        e.to_string(),
                    );
                }
            }
        }
    }
}
