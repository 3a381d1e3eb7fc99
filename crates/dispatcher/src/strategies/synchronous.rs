//! Synchronous strategy - strictly serial, input order preserved
//!
//! One request at a time, with a courtesy delay between consecutive calls.
//! Outcome emission order equals input order; this is the only strategy
//! with that guarantee.

use contracts::{ApiClient, ApiRequest, ExecutionConfig, Outcome};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::execute_single;

#[instrument(
    name = "synchronous_strategy",
    skip_all,
    fields(requests = batch.len(), interval_secs = config.request_interval_secs)
)]
pub(crate) async fn run<C: ApiClient + Send + Sync>(
    client: &C,
    config: &ExecutionConfig,
    outcome_tx: &mpsc::Sender<Outcome>,
    cancel: &CancellationToken,
    batch: &[ApiRequest],
) {
    for (index, request) in batch.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(
                remaining = batch.len() - index,
                "cancelled, stopping admissions"
            );
            break;
        }

        // Courtesy delay between calls, skipped before the first
        if index > 0 && config.request_interval_secs > 0 {
            let interrupted = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = sleep(Duration::from_secs(config.request_interval_secs)) => false,
            };
            if interrupted {
                info!(
                    remaining = batch.len() - index,
                    "cancelled during inter-request delay, stopping admissions"
                );
                break;
            }
        }

        let outcome = execute_single(client, request, config.retry, cancel).await;
        if outcome_tx.send(outcome).await.is_err() {
            break;
        }
    }
}
