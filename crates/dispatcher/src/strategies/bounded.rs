//! Bounded asynchronous strategy - concurrent with a hard admission ceiling
//!
//! A counting semaphore gates admission: a permit is acquired before each
//! call goes out and released when the call completes, success or failure,
//! so at most `concurrency` requests are ever in flight. Requests are
//! admitted in input order but complete in whatever order the remote API
//! answers.

use std::sync::Arc;

use contracts::{ApiClient, ApiRequest, ExecutionConfig, Outcome};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::execute_single;

#[instrument(
    name = "bounded_strategy",
    skip_all,
    fields(requests = batch.len(), concurrency = config.concurrency)
)]
pub(crate) async fn run<C: ApiClient + Send + Sync + 'static>(
    client: Arc<C>,
    config: &ExecutionConfig,
    outcome_tx: mpsc::Sender<Outcome>,
    cancel: CancellationToken,
    batch: Vec<ApiRequest>,
) {
    let gate = Arc::new(Semaphore::new(config.concurrency));
    let mut tasks: JoinSet<()> = JoinSet::new();
    let total = batch.len();
    let mut admitted = 0usize;

    for request in batch {
        // Acquire before issuing; cancellation stops admission, it never
        // interrupts work that already holds a permit.
        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&gate).acquire_owned() => {
                match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                }
            }
        };

        admitted += 1;
        let client = Arc::clone(&client);
        let tx = outcome_tx.clone();
        let retry = config.retry;
        let task_cancel = cancel.clone();

        tasks.spawn(async move {
            let outcome = execute_single(client.as_ref(), &request, retry, &task_cancel).await;
            // Release admission before the (possibly slow) sink hand-off
            drop(permit);
            let _ = tx.send(outcome).await;
        });
    }

    if admitted < total {
        info!(admitted, total, "cancelled, stopping admissions");
    }

    // In-flight calls always run to completion and record their outcome
    while tasks.join_next().await.is_some() {}
}
